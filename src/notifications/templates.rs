pub struct NotificationTemplates;

impl NotificationTemplates {
    /// HTML body for the guardian sign-in code email.
    pub fn auth_code_email(code: &str) -> String {
        format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: 'Apple SD Gothic Neo', 'Helvetica Neue', Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 480px; margin: 0 auto; padding: 24px; border: 1px solid #e5e5e5; border-radius: 8px; }}
        .header {{ text-align: center; padding-bottom: 16px; border-bottom: 2px solid #f0f0f0; }}
        .header h1 {{ margin: 0; color: #2d3436; font-size: 20px; }}
        .code {{ font-size: 32px; letter-spacing: 8px; font-weight: bold; text-align: center; color: #0984e3; margin: 28px 0; }}
        .note {{ font-size: 14px; color: #636e72; text-align: center; }}
        .footer {{ margin-top: 28px; font-size: 12px; color: #b2bec3; text-align: center; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>소리ai 인증 코드</h1>
        </div>
        <div class="code">{code}</div>
        <p class="note">위 코드를 입력해 로그인을 완료해주세요.<br>코드는 5분간 유효합니다.</p>
        <div class="footer">본인이 요청하지 않았다면 이 메일은 무시하셔도 됩니다.</div>
    </div>
</body>
</html>
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_code_email_embeds_the_code() {
        let body = NotificationTemplates::auth_code_email("042137");
        assert!(body.contains("042137"));
        assert!(body.contains("5분간 유효"));
    }
}
