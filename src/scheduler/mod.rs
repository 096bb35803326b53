/// 로트 상태 전이 스케줄러
/// 고정 주기로 벽시계 비교만으로 두 패스를 순서대로 수행한다:
/// 1) 시작 시각이 지난 DRAFT 로트 활성화
/// 2) 종료 시각이 지난 ACTIVE 로트 마감
/// 활성화 패스가 먼저이므로 아주 짧은 시간대의 로트도 같은 틱 안에서
/// 활성화 후 마감될 수 있다. 틱은 겹치지 않는다.
// region:    --- Imports
use crate::events::DomainEvent;
use crate::lot::model::LotStatus;
use crate::notifier::{emit_best_effort, NotificationSink};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Scheduler SQL
const DUE_FOR_ACTIVATION: &str = r#"
    SELECT id, lot_name FROM lots
    WHERE status = 'DRAFT' AND deleted_at IS NULL
      AND start_time IS NOT NULL AND start_time <= $1
"#;

const DUE_FOR_CLOSE: &str = r#"
    SELECT id, lot_name FROM lots
    WHERE status = 'ACTIVE' AND deleted_at IS NULL
      AND end_time IS NOT NULL AND end_time <= $1
"#;

// 상태 선행조건을 걸어 두면 다른 경로로 이미 전이된 로트는 건드리지 않는다
const ACTIVATE_DUE_LOT: &str = r#"
    UPDATE lots SET status = 'ACTIVE', updated_at = now()
    WHERE id = $1 AND status = 'DRAFT' AND deleted_at IS NULL
"#;

const CLOSE_EXPIRED_LOT: &str = r#"
    UPDATE lots SET status = 'CLOSED', updated_at = now()
    WHERE id = $1 AND status = 'ACTIVE' AND deleted_at IS NULL
"#;
// endregion: --- Scheduler SQL

#[derive(sqlx::FromRow)]
struct DueLot {
    id: Uuid,
    lot_name: String,
}

// region:    --- Lot Scheduler
/// 로트 상태 전이 스케줄러
pub struct LotScheduler {
    pool: Arc<PgPool>,
    notifier: Arc<dyn NotificationSink>,
    interval_secs: u64,
}

impl LotScheduler {
    pub fn new(pool: Arc<PgPool>, notifier: Arc<dyn NotificationSink>) -> Self {
        let interval_secs = std::env::var("SCHEDULER_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        Self {
            pool,
            notifier,
            interval_secs,
        }
    }

    /// 스케줄러 시작. 첫 틱은 즉시 돌고 이후 고정 주기로 반복한다.
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        let notifier = Arc::clone(&self.notifier);
        let period = self.interval_secs;
        info!(
            "{:<12} --> 로트 스케줄러 시작 (주기: {}초)",
            "Scheduler", period
        );
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(period));
            loop {
                interval.tick().await;
                Self::run_tick(&pool, notifier.as_ref()).await;
            }
        });
    }

    /// 한 틱: 활성화 패스 후 마감 패스. 로트별 개별 적용이라
    /// 한 로트의 실패가 나머지를 막지 않는다.
    async fn run_tick(pool: &PgPool, notifier: &dyn NotificationSink) {
        debug!("{:<12} --> 로트 일정 점검", "Scheduler");
        if let Err(e) = Self::activate_due_lots(pool, notifier).await {
            error!("{:<12} --> 활성화 패스 오류: {:?}", "Scheduler", e);
        }
        if let Err(e) = Self::close_expired_lots(pool, notifier).await {
            error!("{:<12} --> 마감 패스 오류: {:?}", "Scheduler", e);
        }
    }

    /// 시작 시각이 지난 DRAFT 로트를 전부 활성화
    async fn activate_due_lots(
        pool: &PgPool,
        notifier: &dyn NotificationSink,
    ) -> Result<(), sqlx::Error> {
        let due: Vec<DueLot> = sqlx::query_as(DUE_FOR_ACTIVATION)
            .bind(Utc::now())
            .fetch_all(pool)
            .await?;
        if due.is_empty() {
            return Ok(());
        }

        info!(
            "{:<12} --> 활성화 대상 로트 {}건",
            "Scheduler",
            due.len()
        );
        for lot in due {
            match sqlx::query(ACTIVATE_DUE_LOT).bind(lot.id).execute(pool).await {
                Ok(done) if done.rows_affected() == 1 => {
                    info!(
                        "{:<12} --> 로트 활성화: {} ({})",
                        "Scheduler", lot.lot_name, lot.id
                    );
                    emit_best_effort(
                        notifier,
                        DomainEvent::LotStatusChanged {
                            lot_id: lot.id,
                            status: LotStatus::Active,
                            timestamp: Utc::now(),
                        },
                    )
                    .await;
                }
                Ok(_) => {} // 다른 경로로 이미 전이됨
                Err(e) => error!(
                    "{:<12} --> 로트 활성화 실패: {} ({:?})",
                    "Scheduler", lot.id, e
                ),
            }
        }
        Ok(())
    }

    /// 종료 시각이 지난 ACTIVE 로트를 전부 마감
    async fn close_expired_lots(
        pool: &PgPool,
        notifier: &dyn NotificationSink,
    ) -> Result<(), sqlx::Error> {
        let expired: Vec<DueLot> = sqlx::query_as(DUE_FOR_CLOSE)
            .bind(Utc::now())
            .fetch_all(pool)
            .await?;
        if expired.is_empty() {
            return Ok(());
        }

        info!(
            "{:<12} --> 마감 대상 로트 {}건",
            "Scheduler",
            expired.len()
        );
        for lot in expired {
            match sqlx::query(CLOSE_EXPIRED_LOT).bind(lot.id).execute(pool).await {
                Ok(done) if done.rows_affected() == 1 => {
                    info!(
                        "{:<12} --> 로트 마감: {} ({})",
                        "Scheduler", lot.lot_name, lot.id
                    );
                    emit_best_effort(
                        notifier,
                        DomainEvent::LotStatusChanged {
                            lot_id: lot.id,
                            status: LotStatus::Closed,
                            timestamp: Utc::now(),
                        },
                    )
                    .await;
                }
                Ok(_) => {}
                Err(e) => error!(
                    "{:<12} --> 로트 마감 실패: {} ({:?})",
                    "Scheduler", lot.id, e
                ),
            }
        }
        Ok(())
    }
}
// endregion: --- Lot Scheduler
