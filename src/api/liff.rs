/// LIFFエントリーページのテンプレート
const LIFF_TEMPLATE: &str = include_str!("../../templates/liff.html");

const LIFF_ID_PLACEHOLDER: &str = "{{ liff_id }}";

/// LIFF IDを埋め込んだエントリーページを生成する
///
/// IDはHTML属性値に入るため、エスケープしてから埋め込む。
pub fn render_liff_page(liff_id: &str) -> String {
    LIFF_TEMPLATE.replace(LIFF_ID_PLACEHOLDER, &escape_html(liff_id))
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
