//! QR code issuance for LIFF deep links.
//!
//! Each physical container gets a PNG whose QR code opens the LIFF app with
//! the container ID as a query parameter.

use crate::domain::ContainerId;
use image::{ImageBuffer, ImageFormat, Luma, imageops};
use qrcode::QrCode;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// LIFFアプリのディープリンクのベースURL
pub const LIFF_BASE_URL: &str = "https://liff.line.me/";

/// 1モジュールあたりのピクセル数
pub const MODULE_PIXELS: u32 = 10;

/// 周囲の余白（モジュール数）
pub const BORDER_MODULES: u32 = 5;

/// QR発行のエラー
#[derive(Debug, Error)]
pub enum QrError {
    #[error("LIFF ID is empty")]
    MissingLiffId,

    #[error("Container ID {0:?} cannot be used as a file name")]
    InvalidContainerId(String),

    #[error("Failed to build LIFF URL")]
    Url(#[from] url::ParseError),

    #[error("Failed to encode QR code")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Failed to write QR image")]
    Image(#[from] image::ImageError),
}

/// 発行したQRコード
#[derive(Debug, Clone)]
pub struct IssuedQr {
    pub url: Url,
    pub path: PathBuf,
}

/// `https://liff.line.me/<liffId>?containerId=<containerId>` を組み立てる
///
/// 容器IDはクエリパラメータとしてエンコードされる。
pub fn liff_deep_link(liff_id: &str, container_id: &ContainerId) -> Result<Url, QrError> {
    let liff_id = liff_id.trim();
    if liff_id.is_empty() {
        return Err(QrError::MissingLiffId);
    }

    let url = Url::parse_with_params(
        &format!("{}{}", LIFF_BASE_URL, liff_id),
        &[("containerId", container_id.as_str())],
    )?;
    Ok(url)
}

/// 出力ファイル名 `<containerId>.png`
///
/// パス区切りを含むIDや空のIDは、出力先ディレクトリの外に書き出したり
/// 隠しファイルになったりするため拒否する。
pub fn qr_file_name(container_id: &ContainerId) -> Result<String, QrError> {
    let id = container_id.as_str();
    let invalid = id.trim().is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);

    if invalid {
        return Err(QrError::InvalidContainerId(id.to_string()));
    }
    Ok(format!("{}.png", id))
}

/// データをQRコード画像にする
///
/// モジュールは10px四方、周囲に白の余白を5モジュール分つける。
pub fn render_qr_image(data: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, QrError> {
    let code = QrCode::new(data.as_bytes())?;

    let symbol = code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .build();

    let border = BORDER_MODULES * MODULE_PIXELS;
    let mut canvas = ImageBuffer::from_pixel(
        symbol.width() + 2 * border,
        symbol.height() + 2 * border,
        Luma([255u8]),
    );
    imageops::overlay(&mut canvas, &symbol, i64::from(border), i64::from(border));

    Ok(canvas)
}

/// 容器用のQRコードPNGを `output_dir` に書き出す
pub fn issue_container_qr(
    liff_id: &str,
    container_id: &ContainerId,
    output_dir: &Path,
) -> Result<IssuedQr, QrError> {
    let url = liff_deep_link(liff_id, container_id)?;
    let path = output_dir.join(qr_file_name(container_id)?);

    let image = render_qr_image(url.as_str())?;
    image.save_with_format(&path, ImageFormat::Png)?;

    tracing::debug!(url = %url, path = %path.display(), "QR code written");
    Ok(IssuedQr { url, path })
}
