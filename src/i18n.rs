// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持印尼语（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "id";

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"id" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use bmn_asset_import::i18n::t;
/// let msg = t("reconcile.missing_code");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use bmn_asset_import::i18n::t_with_args;
/// let msg = t_with_args("reconcile.already_exists", &[("code", "A1-001")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 为全局状态，i18n 相关测试串行化
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("en");
        assert_eq!(current_locale(), "en");

        set_locale(DEFAULT_LOCALE);
        assert_eq!(current_locale(), "id");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("id");
        assert_eq!(t("common.success"), "Berhasil");

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale(DEFAULT_LOCALE);
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("id");
        let msg = t_with_args("reconcile.already_exists", &[("code", "A1-001")]);
        assert!(msg.contains("A1-001"));
        assert!(msg.contains("sudah ada"));

        set_locale("en");
        let msg = t_with_args("reconcile.already_exists", &[("code", "A1-001")]);
        assert!(msg.contains("already exists"));

        set_locale(DEFAULT_LOCALE);
    }
}
