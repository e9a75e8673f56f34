/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnContainerError {
    /// 既に返却済み
    AlreadyReturned,
}
