//! 初期データ読み込み
//!
//! 起動時にCSVファイルからレビューを読み込む。
//! ヘッダー行に`Location`, `ReviewBody`, `Timestamp`（任意で`ReviewId`）を含むこと。
//! ストアの不変条件を満たさない行（無効なロケーション、空の本文、解釈できない日時）は
//! 警告ログを出してスキップする。

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::location::is_valid_location;
use crate::store::{parse_timestamp, Review};

/// 読み込みエラー
#[derive(Debug, Error)]
pub enum LoadError {
    /// ファイルを開けない
    #[error("初期データを開けません: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSVとして解釈できない
    #[error("CSVの解析に失敗しました: {0}")]
    Csv(#[from] csv::Error),
}

/// CSVの1行
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "ReviewId", default)]
    review_id: Option<String>,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "ReviewBody")]
    body: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
}

/// CSVファイルからレビューを読み込む
///
/// # Returns
/// * `Ok(Vec<Review>)` - 読み込んだレビュー（ファイル内の順序）
/// * `Err(LoadError)` - ファイルを開けない、またはCSVの構造が不正
pub fn load_reviews_csv(path: &Path) -> Result<Vec<Review>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_reviews(file)
}

/// 任意のリーダーからCSV形式のレビューを読み込む
pub fn load_reviews<R: Read>(reader: R) -> Result<Vec<Review>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut reviews = Vec::new();
    let mut skipped = 0usize;

    let headers = csv_reader.headers()?.clone();
    for record in csv_reader.records() {
        let record = record?;
        // 引用符内の改行を含む行でも、レコードの開始行を報告する
        let line = record.position().map_or(0, |position| position.line());
        let row: CsvRow = record.deserialize(Some(&headers))?;

        if !is_valid_location(&row.location) {
            tracing::warn!(line, location = %row.location, "無効なロケーションの行をスキップ");
            skipped += 1;
            continue;
        }
        if row.body.is_empty() {
            tracing::warn!(line, "本文が空の行をスキップ");
            skipped += 1;
            continue;
        }
        let Some(timestamp) = parse_timestamp(&row.timestamp) else {
            tracing::warn!(line, timestamp = %row.timestamp, "日時を解釈できない行をスキップ");
            skipped += 1;
            continue;
        };

        reviews.push(Review {
            id: row.review_id.filter(|id| !id.trim().is_empty()),
            location: row.location,
            body: row.body,
            timestamp,
        });
    }

    tracing::info!(loaded = reviews.len(), skipped, "初期データを読み込みました");
    Ok(reviews)
}
