use actix_web::HttpResponse;
use actix_web::ResponseError;
use actix_web::http::StatusCode;
use sm_core::Error;

/// HTTP rendering of [`Error`]: a status class plus `{code, message}`.
#[derive(Debug)]
pub struct Failure(pub Error);

impl From<Error> for Failure {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl ResponseError for Failure {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            Error::InvalidInput(_) | Error::IllegalMove(_) | Error::SelfJoin => StatusCode::BAD_REQUEST,
            Error::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotAParticipant => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::GameNotJoinable
            | Error::OutOfTurn
            | Error::AlreadySettled
            | Error::AlreadyJoined
            | Error::TournamentFull
            | Error::NotOpen
            | Error::InvalidTransition(_) => StatusCode::CONFLICT,
            Error::LedgerContention => StatusCode::SERVICE_UNAVAILABLE,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    fn error_response(&self) -> HttpResponse {
        if let Error::Storage(ref detail) = self.0 {
            log::error!("[http] storage failure: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "code": self.0.code(),
            "message": self.0.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status_classes() {
        assert_eq!(Failure(Error::Unauthorized).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Failure(Error::TournamentFull).status_code(), StatusCode::CONFLICT);
        assert_eq!(Failure(Error::invalid("x")).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Failure(Error::Storage("pg down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
