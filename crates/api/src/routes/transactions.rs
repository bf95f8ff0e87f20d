//! Transaction routes: statement, search, investments and balance changes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Path, Query, Request, State, multipart::MultipartError},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE},
    routing::{delete, get, patch},
};
use axum::extract::rejection::QueryRejection;
use carteira_core::ledger::types::{CreateTransactionInput, LedgerReceipt, Transaction};
use carteira_core::ledger::{LedgerError, TransactionCategory};
use carteira_core::receipt::ReceiptImage;
use carteira_core::statement::{InvestmentSummary, SearchParams, UserStatement};
use carteira_core::store::{TransactionRepository, UserRepository};
use carteira_shared::AppError;
use carteira_shared::types::money::parse_amount;
use carteira_shared::types::{PerPage, TransactionId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;

const NEXT_CURSOR: &str = "x-next-cursor";
const CAN_LOAD_MORE: &str = "x-can-load-more";

/// Creates the transaction router.
pub fn routes<U, T>() -> Router<AppState<U, T>>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    Router::new()
        .route(
            "/transaction/statement",
            get(statement::<U, T>).post(create_transaction::<U, T>),
        )
        .route("/transaction/search", get(search::<U, T>))
        .route("/transaction/investments", get(investments::<U, T>))
        .route("/transaction/{id}", delete(delete_transaction::<U, T>))
        .route("/transaction/{id}/{val}", patch(edit_transaction::<U, T>))
}

/// Amount sent either as a JSON string or a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountField {
    Text(String),
    Number(serde_json::Number),
}

fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<AmountField>::deserialize(deserializer)? {
        Some(AmountField::Text(text)) => text,
        Some(AmountField::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

fn validate_amount_text(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::new("required")
            .with_message("O valor da transação é obrigatório".into()));
    }
    parse_amount(raw)
        .map(|_| ())
        .map_err(|e| ValidationError::new("amount").with_message(e.user_message().into()))
}

fn validate_category_code(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::new("required")
            .with_message("O tipo de transação é obrigatória".into()));
    }
    TransactionCategory::from_str(raw).map(|_| ()).map_err(|_| {
        ValidationError::new("category").with_message("Escolha um tipo de transação válido".into())
    })
}

/// Body of `POST /transaction/statement`, from JSON or multipart fields.
#[derive(Debug, Default, Deserialize, Validate)]
struct CreateTransactionForm {
    #[serde(default, deserialize_with = "amount_text")]
    #[validate(custom(function = "validate_amount_text"))]
    amount: String,
    #[serde(default, rename = "type")]
    #[validate(custom(function = "validate_category_code"))]
    category: String,
}

impl CreateTransactionForm {
    fn into_input(
        self,
        email: &str,
        receipt: Option<ReceiptImage>,
    ) -> ApiResult<CreateTransactionInput> {
        self.validate()?;
        let amount = parse_amount(&self.amount).map_err(LedgerError::from)?;
        let category = TransactionCategory::from_str(&self.category)
            .map_err(|_| ApiError::bad_request("Escolha um tipo de transação válido"))?;
        Ok(CreateTransactionInput {
            email: email.to_string(),
            amount,
            category,
            receipt,
        })
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(
            "O comprovante excede o tamanho máximo permitido".to_string(),
        )
        .into();
    }
    ApiError::bad_request(err.body_text())
}

async fn read_multipart(
    mut multipart: Multipart,
    max_bytes: usize,
) -> ApiResult<(CreateTransactionForm, Option<ReceiptImage>)> {
    let mut form = CreateTransactionForm::default();
    let mut receipt = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "amount" => form.amount = field.text().await.map_err(multipart_error)?,
            "type" => form.category = field.text().await.map_err(multipart_error)?,
            "img" => {
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    let image = ReceiptImage::with_limit(&mime, bytes.to_vec(), max_bytes)?;
                    debug!(mime = image.mime(), bytes = image.size_bytes(), "receipt attached");
                    receipt = Some(image);
                }
            }
            _ => {}
        }
    }

    Ok((form, receipt))
}

/// GET /transaction/statement - Profile plus the most recent transactions.
async fn statement<U, T>(
    State(state): State<AppState<U, T>>,
    user: AuthUser,
) -> ApiResult<Json<UserStatement>>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let statement = state
        .statements
        .user_statement(user.email(), state.statement_size)
        .await?;
    Ok(Json(statement))
}

/// POST /transaction/statement - Record a transaction, optionally with a receipt.
async fn create_transaction<U, T>(
    State(state): State<AppState<U, T>>,
    user: AuthUser,
    request: Request,
) -> ApiResult<(StatusCode, Json<LedgerReceipt>)>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (form, receipt) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        read_multipart(multipart, state.max_attachment_bytes).await?
    } else {
        let Json(form) = Json::<CreateTransactionForm>::from_request(request, &state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        (form, None)
    };

    let input = form.into_input(user.email(), receipt)?;
    let receipt = state.ledger.create_transaction(input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Query string of `GET /transaction/search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    from: Option<String>,
    to: Option<String>,
    #[serde(rename = "type")]
    category: Option<String>,
    per_page: Option<String>,
    pick: Option<String>,
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its UTC day is used).
fn parse_day(raw: Option<&str>, field: &str) -> ApiResult<NaiveDate> {
    let raw = non_blank(raw)
        .ok_or_else(|| ApiError::bad_request(format!("Informe a data '{field}' da busca")))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| ApiError::bad_request(format!("Data inválida em '{field}'")))
}

impl SearchQuery {
    fn into_params(self, email: &str) -> ApiResult<SearchParams> {
        let from = parse_day(self.from.as_deref(), "from")?;
        let to = parse_day(self.to.as_deref(), "to")?;

        let category = non_blank(self.category.as_deref())
            .map(TransactionCategory::from_str)
            .transpose()
            .map_err(|_| ApiError::bad_request("Escolha um tipo de transação válido"))?;

        let per_page = non_blank(self.per_page.as_deref())
            .map(str::parse::<i64>)
            .transpose()
            .map_err(|_| ApiError::bad_request("perPage deve ser um número inteiro"))?;

        let cursor = non_blank(self.pick.as_deref())
            .map(TransactionId::from_str)
            .transpose()
            .map_err(|_| ApiError::bad_request("Cursor de paginação inválido"))?;

        Ok(SearchParams {
            email: email.to_string(),
            cursor,
            from,
            to,
            category,
            per_page: PerPage::clamped(per_page),
        })
    }
}

/// GET /transaction/search - One page of the filtered history.
///
/// The body is the page's transactions; paging state travels in the
/// `x-next-cursor` and `x-can-load-more` headers.
async fn search<U, T>(
    State(state): State<AppState<U, T>>,
    user: AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<(HeaderMap, Json<Vec<Transaction>>)>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let params = query.into_params(user.email())?;
    let page = state.statements.search_transactions(params).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(CAN_LOAD_MORE),
        HeaderValue::from_static(if page.can_load_more { "true" } else { "false" }),
    );
    if let Some(cursor) = page.next_cursor
        && let Ok(value) = HeaderValue::from_str(&cursor.to_string())
    {
        headers.insert(HeaderName::from_static(NEXT_CURSOR), value);
    }

    Ok((headers, Json(page.items)))
}

/// GET /transaction/investments - Invested amount per investment category.
async fn investments<U, T>(
    State(state): State<AppState<U, T>>,
    user: AuthUser,
) -> ApiResult<Json<InvestmentSummary>>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    Ok(Json(state.statements.investments(user.email()).await?))
}

fn parse_transaction_id(raw: &str) -> ApiResult<TransactionId> {
    TransactionId::from_str(raw.trim())
        .map_err(|_| ApiError::bad_request("Identificador de transação inválido"))
}

/// DELETE /transaction/{id} - Remove a transaction and reverse its value.
async fn delete_transaction<U, T>(
    State(state): State<AppState<U, T>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<LedgerReceipt>>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let id = parse_transaction_id(&id)?;
    let receipt = state.ledger.delete_transaction(user.email(), id).await?;
    Ok(Json(receipt))
}

/// PATCH /transaction/{id}/{val} - Change the magnitude of a transaction.
async fn edit_transaction<U, T>(
    State(state): State<AppState<U, T>>,
    user: AuthUser,
    Path((id, val)): Path<(String, String)>,
) -> ApiResult<Json<LedgerReceipt>>
where
    U: UserRepository + 'static,
    T: TransactionRepository + 'static,
{
    let id = parse_transaction_id(&id)?;
    let amount = Decimal::from_str(val.trim())
        .map_err(|_| ApiError::bad_request("O valor da transação deve ser numérico"))?;
    let receipt = state.ledger.edit_transaction(user.email(), id, amount).await?;
    Ok(Json(receipt))
}
