//! APIエラーハンドリング
//!
//! 統一されたエラーレスポンス形式を提供する。
//! すべてのエラーは`{"error": "<メッセージ>"}`のJSON形式で返却される。
//! 区切り文字は従来クライアントとバイト単位で一致するよう`", "`と`": "`を使う。

use std::io;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;

use crate::store::StoreError;

/// APIエラーレスポンスのボディ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// エラーメッセージ（例: "Invalid location"）
    pub error: String,
}

/// APIエラー
///
/// ステータスコードとJSON形式のエラーボディを含む。
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTPステータスコード
    status: StatusCode,
    /// エラーレスポンスボディ
    body: ApiErrorBody,
}

impl ApiError {
    /// 新しいApiErrorを作成
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: error.into(),
            },
        }
    }

    /// 400 Bad Requestエラーを作成
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// 405 Method Not Allowedエラーを作成
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    /// 500 Internal Server Errorを作成
    pub fn internal_error(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    /// エラーメッセージを取得
    pub fn error(&self) -> &str {
        &self.body.error
    }

    /// ステータスコードを取得
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// ストアの検証エラーはすべて400として返す
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::bad_request(err.to_string())
    }
}

/// 区切り文字の後ろに空白を入れる1行形式のJSONフォーマッター
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// エラーボディを`{"error": "..."}`形式にシリアライズする
fn to_spaced_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(body)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match to_spaced_json(&self.body) {
            Ok(body) => (
                self.status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "エラーレスポンスのシリアライズに失敗");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
