use tracing_subscriber::EnvFilter;

/// RUST_LOG 未設定時のフィルタ。SDK 内部の冗長なログは warn 以上に絞る。
pub const DEFAULT_LOG_FILTER: &str = "info,aws_config=warn,aws_smithy_runtime=warn,hyper=warn";

/// JSON 構造化ログを標準出力へ出すグローバルサブスクライバーを登録します。
/// 二重に呼ぶとエラーを返します。
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_env_filter(filter)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(DEFAULT_LOG_FILTER.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn second_init_is_rejected() {
        // Arrange
        let _ = init_tracing();

        // Act
        let result = init_tracing();

        // Assert
        assert!(result.is_err());
    }
}
