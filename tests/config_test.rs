// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置优先级与邮件发送器构建
// ==========================================


use order_review_ops::config::{config_keys, ConfigError, ConfigManager, MailSettings};
use order_review_ops::notification::ReviewMailer;
use test_helpers::create_test_db;

#[test]
fn test_stored_settings_are_read() {
    let (_tmp, conn) = create_test_db().unwrap();
    let manager = ConfigManager::with_env_prefix(&conn, "CFG_IT_STORED_");

    manager
        .set_config_value(config_keys::MAIL_FROM_ADDRESS, "avis@boutique.fr")
        .unwrap();
    manager
        .set_config_value(config_keys::MAIL_SMTP_HOST, "smtp.boutique.fr")
        .unwrap();
    manager
        .set_config_value(config_keys::MAIL_SMTP_USERNAME, "mailer")
        .unwrap();

    let settings = manager.mail_settings().unwrap();
    assert_eq!(settings.from_address, "avis@boutique.fr");
    assert_eq!(settings.smtp_host, "smtp.boutique.fr");
    assert_eq!(settings.smtp_username.as_deref(), Some("mailer"));
    assert_eq!(settings.smtp_password, None);
    assert_eq!(settings.smtp_port, MailSettings::default().smtp_port);
}

#[test]
fn test_env_overrides_stored_value() {
    let (_tmp, conn) = create_test_db().unwrap();
    let manager = ConfigManager::with_env_prefix(&conn, "CFG_IT_ENV_");

    manager
        .set_config_value(config_keys::MAIL_SMTP_PORT, "2525")
        .unwrap();
    std::env::set_var("CFG_IT_ENV_MAIL_SMTP_PORT", "465");

    assert_eq!(manager.mail_settings().unwrap().smtp_port, 465);

    std::env::remove_var("CFG_IT_ENV_MAIL_SMTP_PORT");
    assert_eq!(manager.mail_settings().unwrap().smtp_port, 2525);
}

#[test]
fn test_invalid_port_is_reported() {
    let (_tmp, conn) = create_test_db().unwrap();
    let manager = ConfigManager::with_env_prefix(&conn, "CFG_IT_INVALID_");

    manager
        .set_config_value(config_keys::MAIL_SMTP_PORT, "99999")
        .unwrap();

    match manager.mail_settings() {
        Err(ConfigError::InvalidValue { key, value, .. }) => {
            assert_eq!(key, config_keys::MAIL_SMTP_PORT);
            assert_eq!(value, "99999");
        }
        other => panic!("expected InvalidValue, got {:?}", other),
    }
}

#[test]
fn test_mailer_builds_from_settings() {
    // 构建传输层不会建立连接
    let settings = MailSettings::default();
    assert!(ReviewMailer::from_settings(&settings).is_ok());

    let authenticated = MailSettings {
        smtp_host: "smtp.example.com".to_string(),
        smtp_port: 587,
        smtp_username: Some("user".to_string()),
        smtp_password: Some("secret".to_string()),
        ..MailSettings::default()
    };
    let mailer = ReviewMailer::from_settings(&authenticated).unwrap();
    assert_eq!(
        mailer.subject_for("ORD1"),
        "Partagez votre avis sur votre commande ORD1"
    );
}
