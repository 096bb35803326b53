/// 사용자 관리 커맨드. 코어가 소유한 유일한 사용자 변경은
/// 관리자에 의한 is_active 토글뿐이며, 사용자는 절대 하드 삭제되지 않는다.
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::DomainError;
use crate::user::model::User;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

/// 사용자 활성/비활성 토글 명령
#[derive(Debug, Clone, Deserialize)]
pub struct SetUserActiveCommand {
    pub is_active: bool,
}

const SET_USER_ACTIVE: &str = r#"
    UPDATE users
    SET is_active = $2, updated_at = now()
    WHERE id = $1 AND deleted_at IS NULL
    RETURNING id, name, email, password, role, budget, is_active, created_at, updated_at, deleted_at
"#;

/// 사용자 활성 상태 변경. 비활성 사용자는 쓰기 작업이 막히고
/// 낙찰 대상에서도 제외되지만, 조회는 계속 허용된다.
pub async fn set_user_active(
    db: &DatabaseManager,
    user_id: Uuid,
    is_active: bool,
) -> Result<User, DomainError> {
    info!(
        "{:<12} --> 사용자 활성 상태 변경: {} → {}",
        "UserCmd", user_id, is_active
    );

    let user = db
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(SET_USER_ACTIVE)
                    .bind(user_id)
                    .bind(is_active)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(DomainError::NotFound { entity: "사용자" })
            })
        })
        .await?;

    info!(
        "{:<12} --> 사용자 활성 상태 변경 완료: {} (is_active={})",
        "UserCmd", user.id, user.is_active
    );
    Ok(user)
}
