//! センチメント分析
//!
//! レビュー本文から極性スコア（compound / pos / neu / neg）を算出する。
//! ハンドラーは`SentimentAnalyzer`トレイト越しに呼び出すため、実装は差し替え可能。
//! 本番では`vader_sentiment`クレートのVADER分析器を使う。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vader_sentiment::SentimentIntensityAnalyzer;

/// 極性スコア
///
/// `pos`/`neu`/`neg`は合計がほぼ1.0になる割合（小数第3位で丸め）、
/// `compound`は[-1, 1]の総合スコア（小数第4位で丸め）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

/// センチメント分析器
///
/// 本文のみから決定的にスコアを算出する純粋関数として振る舞うこと。
pub trait SentimentAnalyzer: Send + Sync {
    fn polarity_scores(&self, text: &str) -> SentimentScores;
}

/// VADERによるセンチメント分析器
pub struct VaderAnalyzer {
    inner: SentimentIntensityAnalyzer<'static>,
}

impl Default for VaderAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl VaderAnalyzer {
    /// 組み込みのVADER語彙で分析器を作成
    pub fn new() -> Self {
        Self {
            inner: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl SentimentAnalyzer for VaderAnalyzer {
    fn polarity_scores(&self, text: &str) -> SentimentScores {
        let raw = self.inner.polarity_scores(text);
        SentimentScores {
            neg: round_to(score(&raw, "neg"), 3),
            neu: round_to(score(&raw, "neu"), 3),
            pos: round_to(score(&raw, "pos"), 3),
            compound: round_to(score(&raw, "compound"), 4),
        }
    }
}

fn score(raw: &HashMap<&str, f64>, key: &str) -> f64 {
    raw.get(key).copied().unwrap_or(0.0)
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(text: &str) -> SentimentScores {
        VaderAnalyzer::new().polarity_scores(text)
    }

    fn assert_compound(text: &str, expected: f64) {
        let s = scores(text);
        assert!(
            (s.compound - expected).abs() < 1e-4,
            "{:?} のcompoundが{}でない: {:?}",
            text,
            expected,
            s
        );
    }

    fn assert_proportions_sum_to_one(s: &SentimentScores) {
        let total = s.neg + s.neu + s.pos;
        assert!((total - 1.0).abs() <= 0.002, "割合の合計が1.0でない: {:?}", s);
    }

    /// 一般的なレビュー語彙がVADERの値で採点されることを確認
    #[test]
    fn test_common_review_vocabulary() {
        assert_compound("Parking was easy.", 0.4404);
        assert_compound("Yummy food, reasonable prices", 0.5267);
        assert_compound("Meh. Forgettable and overcooked.", -0.0772);
    }

    /// 否定を含む混在した文が正しい符号で採点されることを確認
    #[test]
    fn test_negated_mixed_review_is_positive() {
        assert_compound("Not bad, not great. Parking was easy.", 0.8150);
    }

    /// 肯定的な文が正のcompoundになることを確認
    #[test]
    fn test_positive_text_has_positive_compound() {
        let s = scores("The coffee was great and the staff were friendly");
        assert!(s.compound > 0.5, "{:?}", s);
        assert!(s.pos > s.neg);
        assert_proportions_sum_to_one(&s);
    }

    /// 否定的な文が負のcompoundになることを確認
    #[test]
    fn test_negative_text_has_negative_compound() {
        let s = scores("Terrible service, rude staff and dirty tables");
        assert!(s.compound < -0.5, "{:?}", s);
        assert!(s.neg > s.pos);
        assert_proportions_sum_to_one(&s);
    }

    /// 極性語を含まない文は中立になることを確認
    #[test]
    fn test_neutral_text() {
        let s = scores("We visited on Tuesday afternoon");
        assert_eq!(s.compound, 0.0);
        assert_eq!(s.neu, 1.0);
    }

    /// 空文字はすべて0になることを確認
    #[test]
    fn test_empty_text_scores_zero() {
        let s = scores("");
        assert_eq!(s.compound, 0.0);
        assert_eq!(s.pos, 0.0);
        assert_eq!(s.neg, 0.0);
    }

    /// 否定語で極性が反転することを確認
    #[test]
    fn test_negation_flips_polarity() {
        assert!(scores("The food was good").compound > 0.0);
        assert!(scores("The food was not good").compound < 0.0);
        assert!(scores("The food wasn't good").compound < 0.0);
    }

    /// 強調語・感嘆符で極性が強まることを確認
    #[test]
    fn test_intensity_modifiers() {
        assert!(scores("very good").compound > scores("good").compound);
        assert!(scores("good!!!").compound > scores("good").compound);
    }

    /// スコアが丸められ範囲内に収まることを確認
    #[test]
    fn test_scores_are_rounded_and_bounded() {
        let s = scores("best best best best best love love love amazing amazing!!!!");
        assert!(s.compound <= 1.0 && s.compound > 0.9);
        assert_eq!(s.compound, round_to(s.compound, 4));
        for value in [s.neg, s.neu, s.pos] {
            assert!((0.0..=1.0).contains(&value));
            assert_eq!(value, round_to(value, 3));
        }
    }

    /// 同じ入力には同じスコアを返すことを確認
    #[test]
    fn test_scoring_is_deterministic() {
        let text = "Lovely patio but a bit noisy";
        assert_eq!(scores(text), scores(text));
    }
}
