//! Loan API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan, LoanQuery, LoanWithRefs, ReturnLoan},
};

use super::AuthenticatedUser;

/// List loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans, newest first", body = Vec<LoanWithRefs>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(mut query): Query<LoanQuery>,
) -> AppResult<Json<Vec<LoanWithRefs>>> {
    query.site = claims
        .site_scope(query.site.as_deref())
        .map(str::to_string);
    let loans = state.services.loans.list(&query).await?;
    Ok(Json(loans))
}

/// Get loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get(id).await?;
    Ok(Json(loan))
}

/// Begin a loan (hand equipment to a worker)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan opened", body = Loan),
        (status = 404, description = "Equipment or worker not found"),
        (status = 409, description = "Equipment already on loan or retired"),
        (status = 422, description = "Worker is terminated")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    claims.require_tech()?;
    let loan = state.services.loans.begin(data, &claims.sub).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Complete a return (take equipment back)
#[utoipa::path(
    put,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan returned", body = Loan),
        (status = 409, description = "Loan unknown or already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<ReturnLoan>,
) -> AppResult<Json<Loan>> {
    claims.require_tech()?;
    let loan = state
        .services
        .loans
        .complete_return(id, &data, &claims.sub)
        .await?;
    Ok(Json(loan))
}

/// Mark a missing charger as handed in later
#[utoipa::path(
    put,
    path = "/loans/{id}/charger-returned",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Charger flag set", body = Loan),
        (status = 409, description = "Loan unknown"),
        (status = 422, description = "Loan not eligible")
    )
)]
pub async fn mark_charger_returned(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Loan>> {
    claims.require_tech()?;
    let loan = state
        .services
        .loans
        .mark_charger_returned(id, &claims.sub)
        .await?;
    Ok(Json(loan))
}

/// Delete a cleanly settled loan record
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Record still carries a pending issue")
    )
)]
pub async fn delete_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_tech()?;
    state.services.loans.delete_record(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
