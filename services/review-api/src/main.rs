//! 店舗レビューAPIサーバー
//!
//! 本バイナリは以下の機能を提供する:
//! - レビューの検索とセンチメント分析 (GET /)
//! - レビューの投稿 (POST /)
//! - ヘルスチェック (GET /health)
//!
//! レビューはメモリ上にのみ保持され、プロセス終了とともに失われる。

mod config;
mod error;
mod handler;
mod loader;
mod location;
mod logging;
mod sentiment;
mod store;

use config::ServerConfig;
use sentiment::{SentimentAnalyzer, VaderAnalyzer};
use store::ReviewStore;

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// アプリケーション状態
///
/// ルーター全体で共有される状態を保持する。
#[derive(Clone)]
pub struct AppState {
    /// レビューストア
    pub store: Arc<ReviewStore>,
    /// センチメント分析器
    pub analyzer: Arc<dyn SentimentAnalyzer>,
}

/// ヘルスチェックエンドポイント
async fn health() -> &'static str {
    "OK"
}

/// ルーターを構築する
///
/// `/`はメソッドで検索・投稿を振り分け、それ以外のメソッドには405を返す。
/// TraceLayerによりリクエスト/レスポンスの構造化ログを自動記録する。
///
/// # Arguments
/// * `store` - レビューストア
/// * `analyzer` - センチメント分析器
pub fn create_router(store: Arc<ReviewStore>, analyzer: Arc<dyn SentimentAnalyzer>) -> Router {
    let state = AppState { store, analyzer };

    Router::new()
        .route(
            "/",
            get(handler::list_reviews)
                .post(handler::create_review)
                .fallback(handler::method_not_allowed),
        )
        .route("/health", get(health))
        // リクエストトレーシングレイヤー（method, path, status, latencyを自動記録）
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// シャットダウンシグナルを待機する
///
/// SIGTERMまたはCtrl+C (SIGINT) を待機し、いずれかを受信したらリターンする。
///
/// # Panics
/// シグナルハンドラーの登録に失敗した場合はパニックする。
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Ctrl+C シグナルハンドラーの登録に失敗しました");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM シグナルハンドラーの登録に失敗しました")
            .recv()
            .await;
    };

    // Windows等の非Unix環境ではSIGTERMは利用不可
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            tracing::info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}

/// メイン関数
///
/// 初期データをCSVから読み込み、HTTPサーバーを起動する。
///
/// # 環境変数
/// - `PORT`: リッスンポート（デフォルト: 8000）
/// - `BIND_ADDR`: リッスンアドレス（デフォルト: 0.0.0.0）
/// - `REVIEWS_CSV_PATH`: 初期データCSVのパス（デフォルト: data/reviews.csv）
/// - `RUST_LOG`: ログレベル（デフォルト: info）
#[tokio::main]
async fn main() {
    logging::init_logging();

    tracing::info!("レビューAPI サーバーを起動します");

    let config = ServerConfig::from_env().expect("サーバー設定の読み込みに失敗しました");
    tracing::info!(
        addr = %config.socket_addr(),
        reviews_csv_path = %config.reviews_csv_path.display(),
        "サーバー設定を読み込みました"
    );

    let reviews = loader::load_reviews_csv(&config.reviews_csv_path)
        .expect("初期データの読み込みに失敗しました");
    let store = Arc::new(ReviewStore::from_reviews(reviews));
    if store.is_empty() {
        tracing::warn!("初期データが0件です");
    }
    tracing::info!(count = store.len(), "レビューストアを初期化しました");

    let app = create_router(store, Arc::new(VaderAnalyzer::new()));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("アドレスのバインドに失敗しました");
    tracing::info!("リッスン開始: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("サーバーの起動に失敗しました");

    tracing::info!("サーバーが正常に停止しました");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    /// テスト用のルーターを作成
    fn create_test_router() -> Router {
        create_router(Arc::new(ReviewStore::default()), Arc::new(VaderAnalyzer::new()))
    }

    /// ヘルスチェックエンドポイントが200 OKと"OK"を返すことを確認
    #[tokio::test]
    async fn test_health_endpoint_returns_ok() {
        let app = create_test_router();

        let request = Request::builder()
            .uri("/health")
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    /// 存在しないエンドポイントが404を返すことを確認
    #[tokio::test]
    async fn test_unknown_endpoint_returns_not_found() {
        let app = create_test_router();

        let request = Request::builder()
            .uri("/unknown")
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// 空のストアでの検索は空配列を返すことを確認
    #[tokio::test]
    async fn test_empty_store_returns_empty_array() {
        let app = create_test_router();

        let request = Request::builder()
            .uri("/")
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"[]");
    }
}
