//! Tests for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::pagination("bad cursor"), ErrorCode::Pagination)]
#[case(Error::transaction_start("no tx"), ErrorCode::TransactionStart)]
#[case(Error::transaction_commit("no commit"), ErrorCode::TransactionCommit)]
#[case(Error::validation("bad vote"), ErrorCode::Validation)]
#[case(Error::authorization("not yours"), ErrorCode::Authorization)]
#[case(Error::conflict("email taken"), ErrorCode::Conflict)]
#[case(Error::unhandled("boom"), ErrorCode::Unhandled)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::Validation, "   ");
    assert_eq!(result, Err(ErrorValidationError::EmptyMessage));
}

#[rstest]
fn blank_messages_fall_back_to_the_code_description() {
    let error = Error::not_found("");
    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.message(), "record not found");
}

#[rstest]
fn display_uses_message() {
    assert_eq!(Error::not_found("recipe 3").to_string(), "recipe 3");
}

#[rstest]
fn serialises_code_in_snake_case() {
    let error = Error::transaction_commit("commit failed");
    let value = serde_json::to_value(&error).expect("serialise");
    assert_eq!(
        value,
        json!({
            "code": "transaction_commit",
            "message": "commit failed",
        })
    );
}
