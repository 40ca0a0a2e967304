//! インメモリレビューストア
//!
//! レビューの検索・追記機能を提供する。
//! - 追記のみ（更新・削除はない）、挿入順を保持する
//! - 読み取りと追記は単一の`RwLock`で保護し、追記途中のレコードは観測されない
//! - プロセス終了とともに内容は失われる

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::is_valid_location;

/// レスポンスで使うタイムスタンプ形式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 日時として解釈を試みる形式（日付のみの形式は別途処理）
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// ストアエラー
///
/// 表示文字列はそのままAPIのエラーボディとして返却される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 有効なロケーション集合に含まれない
    #[error("Invalid location")]
    InvalidLocation(String),

    /// 必須フィールド（ロケーションまたは本文）が空
    #[error("Missing Location or ReviewBody")]
    MissingField,
}

/// レビュー
///
/// 作成後は変更されない。JSONのフィールド名・形式はこの定義が唯一の正となり、
/// 検索・投稿の両方のレスポンスで共有する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    /// レビューID（初期データで未設定の場合はNone）
    #[serde(rename = "ReviewId", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// ロケーション（"City, State"）
    #[serde(rename = "Location")]
    pub location: String,
    /// レビュー本文
    #[serde(rename = "ReviewBody")]
    pub body: String,
    /// 投稿日時（秒精度、ローカル時刻表現のまま保持）
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
}

/// `Review::timestamp`を`YYYY-MM-DD HH:MM:SS`で読み書きする
mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// 日時文字列を寛容に解釈する
///
/// 解釈できない値は`None`を返す（検索条件としては「指定なし」と同じ扱い）。
///
/// # 対応形式
/// - `YYYY-MM-DD`（00:00:00として扱う）
/// - `YYYY-MM-DD HH:MM` / `YYYY-MM-DD HH:MM:SS[.fff]`（`T`区切りも可）
/// - RFC 3339（そのオフセットでのローカル時刻として扱う）
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(timestamp.trunc_subsecs(0));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.naive_local().trunc_subsecs(0))
}

/// 検索フィルター
///
/// 各条件はAND結合される。`None`の条件は絞り込みに使わない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    /// ロケーション（完全一致）
    pub location: Option<String>,
    /// 開始日時（この日時以降）
    pub start: Option<NaiveDateTime>,
    /// 終了日時（この日時以前）
    pub end: Option<NaiveDateTime>,
}

impl ReviewFilter {
    /// クエリパラメータの生の値からフィルターを構築する
    ///
    /// 日時として解釈できない`start_date`/`end_date`は無視する。
    pub fn from_params(
        location: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Self {
        Self {
            location: location.map(str::to_string),
            start: start_date.and_then(parse_timestamp),
            end: end_date.and_then(parse_timestamp),
        }
    }

    fn matches(&self, review: &Review) -> bool {
        if let Some(location) = &self.location
            && review.location != *location
        {
            return false;
        }
        if let Some(start) = self.start
            && review.timestamp < start
        {
            return false;
        }
        if let Some(end) = self.end
            && review.timestamp > end
        {
            return false;
        }
        true
    }
}

/// インメモリレビューストア
///
/// ルーター全体で`Arc`を介して共有される。
#[derive(Debug, Default)]
pub struct ReviewStore {
    reviews: RwLock<Vec<Review>>,
}

impl ReviewStore {
    /// 初期データからストアを作成
    ///
    /// 挿入順は渡された順序のまま保持する。
    pub fn from_reviews(reviews: Vec<Review>) -> Self {
        Self {
            reviews: RwLock::new(reviews),
        }
    }

    /// 保持しているレビュー件数
    pub fn len(&self) -> usize {
        self.reviews
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// レビューが1件もないか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// フィルター条件でレビューを検索
    ///
    /// 呼び出し時点のスナップショットから条件に一致するものを挿入順で返す。
    ///
    /// # Returns
    /// * `Ok(Vec<Review>)` - 一致したレビュー（挿入順）
    /// * `Err(StoreError::InvalidLocation)` - ロケーションが有効な集合に含まれない
    pub fn query(&self, filter: &ReviewFilter) -> Result<Vec<Review>, StoreError> {
        if let Some(location) = &filter.location
            && !is_valid_location(location)
        {
            return Err(StoreError::InvalidLocation(location.clone()));
        }

        let reviews = self.reviews.read().unwrap_or_else(PoisonError::into_inner);
        Ok(reviews
            .iter()
            .filter(|review| filter.matches(review))
            .cloned()
            .collect())
    }

    /// レビューを追記
    ///
    /// 新しいID（UUID v4）と現在時刻（秒精度）を付与して末尾に追加する。
    /// 検証に失敗した場合、ストアは変更されない。
    ///
    /// # Returns
    /// * `Ok(Review)` - 追加されたレビュー
    /// * `Err(StoreError::MissingField)` - ロケーションまたは本文が空
    /// * `Err(StoreError::InvalidLocation)` - ロケーションが有効な集合に含まれない
    pub fn append(&self, location: &str, body: &str) -> Result<Review, StoreError> {
        if location.is_empty() || body.is_empty() {
            return Err(StoreError::MissingField);
        }
        if !is_valid_location(location) {
            return Err(StoreError::InvalidLocation(location.to_string()));
        }

        let review = Review {
            id: Some(uuid::Uuid::new_v4().to_string()),
            location: location.to_string(),
            body: body.to_string(),
            timestamp: Local::now().naive_local().trunc_subsecs(0),
        };

        self.reviews
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(review.clone());

        Ok(review)
    }
}
