//! Translation of transport errors into the pipeline error taxonomy.

use datasus_core::Error;
use suppaftp::{FtpError, Status};

/// Converts a [`reqwest::Error`] into a pipeline [`Error`].
pub(crate) fn from_reqwest(err: reqwest::Error) -> Error {
    let base = match err.status() {
        Some(reqwest::StatusCode::NOT_FOUND) | Some(reqwest::StatusCode::GONE) => {
            Error::not_found()
        }
        _ if err.is_builder() => Error::invalid_input(),
        _ => Error::operation_failure(),
    };

    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    };

    base.with_message(message).with_source(err)
}

/// Converts a [`FtpError`] into a pipeline [`Error`].
pub(crate) fn from_ftp(err: FtpError) -> Error {
    let base = match &err {
        FtpError::UnexpectedResponse(response)
            if matches!(response.status, Status::FileUnavailable) =>
        {
            Error::not_found()
        }
        _ => Error::operation_failure(),
    };

    base.with_message(err.to_string()).with_source(err)
}

#[cfg(test)]
mod tests {
    use datasus_core::ErrorKind;

    use super::*;

    fn status_error(status: u16) -> reqwest::Error {
        let response = http::Response::builder()
            .status(status)
            .body(String::new())
            .unwrap();
        reqwest::Response::from(response)
            .error_for_status()
            .unwrap_err()
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(from_reqwest(status_error(404)).kind(), ErrorKind::NotFound);
        assert_eq!(from_reqwest(status_error(410)).kind(), ErrorKind::NotFound);
        assert_eq!(
            from_reqwest(status_error(403)).kind(),
            ErrorKind::OperationFailure
        );
        assert_eq!(
            from_reqwest(status_error(503)).kind(),
            ErrorKind::OperationFailure
        );
    }

    #[test]
    fn connection_errors_are_operation_failures() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = from_ftp(FtpError::ConnectionError(io));
        assert_eq!(err.kind(), ErrorKind::OperationFailure);
        assert!(std::error::Error::source(&err).is_some());
    }
}
