use crate::errors::{ReportError, ReportResult};

pub const ACCOUNT_ID_LEN: usize = 12;

/// Console sign-in URL for an account: `https://<id>.signin.aws.amazon.com/console`.
pub fn signin_url(account_id: &str) -> ReportResult<String> {
    validate_account_id(account_id)?;
    Ok(format!("https://{}.signin.aws.amazon.com/console", account_id))
}

pub fn validate_account_id(account_id: &str) -> ReportResult<()> {
    if account_id.len() != ACCOUNT_ID_LEN || !account_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReportError::InvalidArgument(format!(
            "account id must be exactly {} digits, got {:?}",
            ACCOUNT_ID_LEN, account_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_console_url() {
        assert_eq!(
            signin_url("123456789012").expect("valid id"),
            "https://123456789012.signin.aws.amazon.com/console"
        );
    }

    #[test]
    fn keeps_leading_zeros() {
        assert_eq!(
            signin_url("000000000001").expect("valid id"),
            "https://000000000001.signin.aws.amazon.com/console"
        );
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["", "12345678901", "1234567890123", "12345678901a", " 23456789012", "１２３４５６７８９０１２"] {
            let err = signin_url(bad).expect_err("malformed id");
            assert!(matches!(err, ReportError::InvalidArgument(_)), "{bad:?}");
        }
    }
}
