use orgwiki_core::errors::{ReportError, RunError};
use orgwiki_core::model::ErrorKind;
use orgwiki_core::service::exit_code_for_report_error;

pub fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    if let Some(report_err) = err.downcast_ref::<ReportError>() {
        return exit_code_for_report_error(report_err);
    }
    if let Some(run_err) = err.downcast_ref::<RunError>() {
        return run_err.exit_code();
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return 2;
    }
    1
}

pub fn error_kind_for_error(err: &anyhow::Error) -> ErrorKind {
    if let Some(report_err) = err.downcast_ref::<ReportError>() {
        return report_err.kind();
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return ErrorKind::InvalidArgument;
    }
    ErrorKind::Runtime
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn maps_report_errors_to_distinct_codes() {
        let cases = [
            (ReportError::InvalidArgument("x".into()), 2, ErrorKind::InvalidArgument),
            (ReportError::AccessDenied("x".into()), 3, ErrorKind::AccessDenied),
            (ReportError::ServiceUnavailable("x".into()), 4, ErrorKind::ServiceUnavailable),
            (ReportError::PublishFailure("x".into()), 5, ErrorKind::PublishFailure),
        ];
        for (err, code, kind) in cases {
            let err = anyhow::Error::new(err);
            assert_eq!(exit_code_for_error(&err), code);
            assert_eq!(error_kind_for_error(&err), kind);
        }
    }

    #[test]
    fn context_does_not_hide_the_kind() {
        let err = Err::<(), _>(ReportError::PublishFailure("HTTP 500".into()))
            .context("publish prod")
            .expect_err("error");
        assert_eq!(exit_code_for_error(&err), 5);
    }

    #[test]
    fn partial_failure_is_generic_nonzero() {
        let err = anyhow::Error::new(RunError::SetsFailed {
            failed: vec!["prod".to_string()],
            total: 2,
            code: 1,
        });
        assert_eq!(exit_code_for_error(&err), 1);
        assert_eq!(error_kind_for_error(&err), ErrorKind::Runtime);
    }

    #[test]
    fn shared_failure_keeps_its_code() {
        let err = anyhow::Error::new(RunError::SetsFailed {
            failed: vec!["prod".to_string(), "dev".to_string()],
            total: 2,
            code: 5,
        });
        assert_eq!(exit_code_for_error(&err), 5);
    }
}
