//! 有効なロケーションの定義
//!
//! 検索（GET）と投稿（POST）の両方で同じ集合を使って検証する。

/// 受け付けるロケーション（"City, State" 形式、18件）
pub const VALID_LOCATIONS: [&str; 18] = [
    "Albuquerque, New Mexico",
    "Carlsbad, California",
    "Chula Vista, California",
    "Colorado Springs, Colorado",
    "Denver, Colorado",
    "El Cajon, California",
    "El Paso, Texas",
    "Escondido, California",
    "Fresno, California",
    "La Mesa, California",
    "Las Vegas, Nevada",
    "Los Angeles, California",
    "Oceanside, California",
    "Phoenix, Arizona",
    "Sacramento, California",
    "Salt Lake City, Utah",
    "San Diego, California",
    "Tucson, Arizona",
];

/// ロケーションが有効な集合に含まれるか判定する
///
/// 比較は完全一致（大文字小文字・空白も区別する）。
pub fn is_valid_location(location: &str) -> bool {
    VALID_LOCATIONS.contains(&location)
}
