//! レビューAPIのリクエストハンドラー
//!
//! - 検索 (GET /): クエリ文字列で絞り込み、センチメントスコアを付与してcompound降順で返す
//! - 投稿 (POST /): フォーム形式のボディからレビューを追記する
//! - その他のメソッド: 405 Method Not Allowed

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::sentiment::{SentimentAnalyzer, SentimentScores};
use crate::store::{Review, ReviewFilter, StoreError};
use crate::AppState;

/// センチメントスコア付きのレビュー（検索結果の1行）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredReview {
    #[serde(flatten)]
    pub review: Review,
    pub sentiment: SentimentScores,
}

/// `application/x-www-form-urlencoded`形式の入力から、空でない最初の値を取り出す
fn form_value(input: &[u8], key: &str) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

/// 各レビューにスコアを付与し、compound降順に並べる
///
/// 同じcompoundのレビューは元の順序（挿入順）を保つ。
pub fn score_and_sort(analyzer: &dyn SentimentAnalyzer, reviews: Vec<Review>) -> Vec<ScoredReview> {
    let mut rows: Vec<ScoredReview> = reviews
        .into_iter()
        .map(|review| {
            let sentiment = analyzer.polarity_scores(&review.body);
            ScoredReview { review, sentiment }
        })
        .collect();

    // sort_byは安定ソート
    rows.sort_by(|a, b| b.sentiment.compound.total_cmp(&a.sentiment.compound));
    rows
}

/// インデント付きJSONのレスポンスを構築する
///
/// Content-Lengthはボディのバイト長と一致させる。
fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(body) => (
            status,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
                (header::CONTENT_LENGTH, HeaderValue::from(body.len())),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "レスポンスのシリアライズに失敗");
            ApiError::internal_error("Failed to serialize response").into_response()
        }
    }
}

/// 検証エラーをログに記録し、エラーレスポンスに変換する
fn reject(operation: &str, err: StoreError) -> Response {
    match &err {
        StoreError::InvalidLocation(location) => {
            tracing::warn!(operation, location = %location, "無効なロケーションのため拒否");
        }
        StoreError::MissingField => {
            tracing::warn!(operation, "必須フィールドが不足しているため拒否");
        }
    }

    let error = ApiError::from(err);
    tracing::debug!(status = %error.status(), error = error.error(), "エラーレスポンスを返却");
    error.into_response()
}

/// レビュー検索エンドポイント (GET /)
///
/// # Query Parameters
/// - `location`: ロケーション（有効な集合に含まれること）
/// - `start_date` / `end_date`: 日付範囲（解釈できない値は無視）
///
/// # Returns
/// - 200 OK: スコア付きレビューのJSON配列（compound降順）
/// - 400 Bad Request: ロケーションが無効
pub async fn list_reviews(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let query = query.unwrap_or_default();
    let location = form_value(query.as_bytes(), "location");
    let start_date = form_value(query.as_bytes(), "start_date");
    let end_date = form_value(query.as_bytes(), "end_date");

    tracing::info!(
        location = ?location,
        start_date = ?start_date,
        end_date = ?end_date,
        "レビュー検索リクエストを受信"
    );

    let filter = ReviewFilter::from_params(
        location.as_deref(),
        start_date.as_deref(),
        end_date.as_deref(),
    );
    tracing::debug!(start = ?filter.start, end = ?filter.end, "日付範囲を解釈");

    let reviews = match state.store.query(&filter) {
        Ok(reviews) => reviews,
        Err(e) => return reject("list_reviews", e),
    };

    let rows = score_and_sort(state.analyzer.as_ref(), reviews);
    tracing::info!(count = rows.len(), "検索結果を返却");
    json_response(StatusCode::OK, &rows)
}

/// レビュー投稿エンドポイント (POST /)
///
/// ボディは`Location`と`ReviewBody`を含むフォーム形式。
///
/// # Returns
/// - 201 Created: 追加されたレビュー（JSON）
/// - 400 Bad Request: 必須フィールドが空、またはロケーションが無効
pub async fn create_review(State(state): State<AppState>, body: Bytes) -> Response {
    let location = form_value(&body, "Location");
    let review_body = form_value(&body, "ReviewBody");

    tracing::info!(
        location = ?location,
        body_len = review_body.as_ref().map(String::len),
        "レビュー投稿リクエストを受信"
    );

    let (Some(location), Some(review_body)) = (location, review_body) else {
        return reject("create_review", StoreError::MissingField);
    };

    match state.store.append(&location, &review_body) {
        Ok(review) => {
            tracing::info!(review_id = ?review.id, location = %review.location, "レビューを追加");
            json_response(StatusCode::CREATED, &review)
        }
        Err(e) => reject("create_review", e),
    }
}

/// 未対応メソッド用のハンドラー
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        [(header::ALLOW, HeaderValue::from_static("GET, POST"))],
        ApiError::method_not_allowed(),
    )
}
