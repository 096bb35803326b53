// region:    --- Imports
use axum::routing::{get, post, put};
use axum::Router;
use diamond_auction_service::database::DatabaseManager;
use diamond_auction_service::handlers;
use diamond_auction_service::notifier::{KafkaNotifier, NotificationSink};
use diamond_auction_service::scheduler::LotScheduler;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 개발/테스트 환경에서만 전체 재생성 (RECREATE_DB=1)
    if matches!(std::env::var("RECREATE_DB").as_deref(), Ok("1")) {
        if let Err(e) = db_manager.recreate_database().await {
            error!("{:<12} --> 데이터베이스 재생성 실패: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> 데이터베이스 재생성 완료", "Main");
    }

    // 스키마 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 알림 싱크 생성 (Kafka 프로듀서, 쓰기 전용)
    let notifier: Arc<dyn NotificationSink> = Arc::new(KafkaNotifier::from_env());
    info!("{:<12} --> 알림 싱크 초기화 성공", "Main");

    // 로트 상태 전이 스케줄러 시작
    let scheduler = LotScheduler::new(db_manager.get_pool(), Arc::clone(&notifier));
    scheduler.start().await;

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        // 관리자: 로트 수명주기
        .route(
            "/admin/lots",
            post(handlers::handle_create_lot).get(handlers::handle_list_lots),
        )
        .route(
            "/admin/lots/:lot_id",
            get(handlers::handle_get_lot)
                .patch(handlers::handle_edit_lot)
                .delete(handlers::handle_delete_lot),
        )
        .route(
            "/admin/lots/:lot_id/reschedule",
            put(handlers::handle_reschedule_lot),
        )
        .route(
            "/admin/lots/:lot_id/activate",
            post(handlers::handle_activate_lot),
        )
        .route("/admin/lots/:lot_id/close", post(handlers::handle_close_lot))
        // 관리자: 입찰 모니터링
        .route(
            "/admin/lots/:lot_id/bids",
            get(handlers::handle_admin_bids_for_lot),
        )
        .route(
            "/admin/bids/:bid_id/history",
            get(handlers::handle_admin_bid_history),
        )
        // 관리자: 낙찰 결과
        .route("/admin/results", get(handlers::handle_admin_list_results))
        .route(
            "/admin/results/:lot_id",
            post(handlers::handle_declare_result).get(handlers::handle_admin_result),
        )
        // 관리자: 사용자
        .route("/admin/users", get(handlers::handle_admin_list_users))
        .route("/admin/users/:user_id", get(handlers::handle_admin_get_user))
        .route(
            "/admin/users/:user_id/active",
            axum::routing::patch(handlers::handle_set_user_active),
        )
        // 사용자: 카탈로그/입찰/결과
        .route("/user/lots", get(handlers::handle_available_lots))
        .route("/user/lots/:lot_id", get(handlers::handle_user_lot_detail))
        .route("/user/lots/:lot_id/bid", get(handlers::handle_own_bid))
        .route("/user/bids", post(handlers::handle_place_bid))
        .route("/user/bids/:bid_id", put(handlers::handle_update_bid))
        .route("/user/results/:lot_id", get(handlers::handle_user_result))
        .layer(cors)
        .with_state((db_manager, notifier));

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
