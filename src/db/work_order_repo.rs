// src/db/work_order_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::translate_db_error, error::AppError},
    db::store::WorkOrderStore,
    models::{
        assignment::{Assignment, CandidateAssignment, TaskMetadata, WorkType},
        request::Request,
        work_order::{WorkOrder, WorkOrderDraft, WorkOrderFilter},
    },
};

#[derive(Clone)]
pub struct WorkOrderRepository {
    pool: PgPool,
}

impl WorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// =========================================================================
//  HELPERS (aceitam pool ou transação)
// =========================================================================

async fn insert_assignment<'e, E>(
    executor: E,
    work_order_id: i64,
    candidate: &CandidateAssignment,
) -> Result<Assignment, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Assignment>(
        r#"
        INSERT INTO work_order_executors (
            work_order_id, executor_id, work_type, service_type, amount, description, metadata
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(work_order_id)
    .bind(candidate.executor_id)
    .bind(candidate.work_type)
    .bind(candidate.service_type)
    .bind(candidate.amount)
    .bind(&candidate.description)
    .bind(Json(&candidate.metadata))
    .fetch_one(executor)
    .await
    .map_err(translate_db_error)
}

#[async_trait]
impl WorkOrderStore for WorkOrderRepository {
    async fn find_request(&self, request_id: i64) -> Result<Option<Request>, AppError> {
        let request = sqlx::query_as::<_, Request>(
            r#"
            SELECT id, manager_id, customer_name, customer_phone, car_brand, car_model, created_at
            FROM requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn create_work_order(
        &self,
        draft: WorkOrderDraft,
        assignments: Vec<CandidateAssignment>,
    ) -> Result<(WorkOrder, Vec<Assignment>), AppError> {
        // Tudo ou nada: OS sem atribuições não pode ser reportada como sucesso
        let mut tx = self.pool.begin().await?;

        let seq: i64 = sqlx::query_scalar("SELECT nextval('work_order_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let order_number = format!("WO-{:06}", seq);

        let order = sqlx::query_as::<_, WorkOrder>(
            r#"
            INSERT INTO work_orders (
                order_number, total_amount, payment_method,
                manager_id, master_id, executor_id, request_id,
                customer_name, customer_phone, car_brand, car_model, vin, car_condition,
                armatura_executors, fixed_services, body_parts_data, services_data, additional_services,
                dismantling, dismantling_price, disassembly, disassembly_price,
                assembly, assembly_price, mounting, mounting_price,
                status, photos_before, photos_after
            )
            VALUES (
                $1, $2, $3,
                $4, $5, $6, $7,
                $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18,
                $19, $20, $21, $22,
                $23, $24, $25, $26,
                $27, $28, $29
            )
            RETURNING *
            "#,
        )
        .bind(&order_number)
        .bind(draft.total_amount)
        .bind(draft.payment_method)
        .bind(draft.manager_id)
        .bind(draft.master_id)
        .bind(draft.executor_id)
        .bind(draft.request_id)
        .bind(&draft.customer_name)
        .bind(&draft.customer_phone)
        .bind(&draft.car_brand)
        .bind(&draft.car_model)
        .bind(&draft.vin)
        .bind(draft.car_condition)
        .bind(Json(&draft.armatura_executors))
        .bind(Json(&draft.fixed_services))
        .bind(Json(&draft.body_parts_data))
        .bind(Json(&draft.services_data))
        .bind(Json(&draft.additional_services))
        .bind(draft.legacy.dismantling)
        .bind(draft.legacy.dismantling_price)
        .bind(draft.legacy.disassembly)
        .bind(draft.legacy.disassembly_price)
        .bind(draft.legacy.assembly)
        .bind(draft.legacy.assembly_price)
        .bind(draft.legacy.mounting)
        .bind(draft.legacy.mounting_price)
        .bind(draft.status)
        .bind(&draft.photos_before)
        .bind(&draft.photos_after)
        .fetch_one(&mut *tx)
        .await
        .map_err(translate_db_error)?;

        let mut saved = Vec::with_capacity(assignments.len());
        for candidate in &assignments {
            saved.push(insert_assignment(&mut *tx, order.id, candidate).await?);
        }

        tx.commit().await?;

        Ok((order, saved))
    }

    async fn find_work_order(&self, id: i64) -> Result<Option<WorkOrder>, AppError> {
        let order = sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    async fn list_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        let orders = sqlx::query_as::<_, WorkOrder>(
            r#"
            SELECT wo.* FROM work_orders wo
            WHERE ($1::work_order_status IS NULL OR wo.status = $1)
              AND ($2::BIGINT IS NULL OR wo.manager_id = $2)
              AND ($3::BIGINT IS NULL OR wo.master_id = $3)
              AND (
                $4::BIGINT IS NULL
                OR wo.executor_id = $4
                OR EXISTS (
                    SELECT 1 FROM work_order_executors e
                    WHERE e.work_order_id = wo.id AND e.executor_id = $4
                )
              )
            ORDER BY wo.created_at DESC, wo.id DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.manager_id)
        .bind(filter.master_id)
        .bind(filter.visible_to_executor)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn save_work_order(&self, order: &WorkOrder) -> Result<WorkOrder, AppError> {
        sqlx::query_as::<_, WorkOrder>(
            r#"
            UPDATE work_orders SET
                total_amount = $2, payment_method = $3,
                manager_id = $4, master_id = $5, executor_id = $6,
                customer_name = $7, customer_phone = $8,
                car_brand = $9, car_model = $10, vin = $11, car_condition = $12,
                armatura_executors = $13, fixed_services = $14, body_parts_data = $15,
                services_data = $16, additional_services = $17,
                dismantling = $18, dismantling_price = $19,
                disassembly = $20, disassembly_price = $21,
                assembly = $22, assembly_price = $23,
                mounting = $24, mounting_price = $25,
                status = $26, photos_before = $27, photos_after = $28,
                started_at = $29, completed_at = $30,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(order.total_amount)
        .bind(order.payment_method)
        .bind(order.manager_id)
        .bind(order.master_id)
        .bind(order.executor_id)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.car_brand)
        .bind(&order.car_model)
        .bind(&order.vin)
        .bind(order.car_condition)
        .bind(Json(&order.armatura_executors))
        .bind(Json(&order.fixed_services))
        .bind(Json(&order.body_parts_data))
        .bind(Json(&order.services_data))
        .bind(Json(&order.additional_services))
        .bind(order.legacy.dismantling)
        .bind(order.legacy.dismantling_price)
        .bind(order.legacy.disassembly)
        .bind(order.legacy.disassembly_price)
        .bind(order.legacy.assembly)
        .bind(order.legacy.assembly_price)
        .bind(order.legacy.mounting)
        .bind(order.legacy.mounting_price)
        .bind(order.status)
        .bind(&order.photos_before)
        .bind(&order.photos_after)
        .bind(order.started_at)
        .bind(order.completed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(translate_db_error)?
        .ok_or_else(|| AppError::NotFound(format!("work order {}", order.id)))
    }

    async fn list_assignments(&self, work_order_id: i64) -> Result<Vec<Assignment>, AppError> {
        let assignments = sqlx::query_as::<_, Assignment>(
            "SELECT * FROM work_order_executors WHERE work_order_id = $1 ORDER BY id",
        )
        .bind(work_order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }

    async fn list_assignments_for_orders(&self, work_order_ids: &[i64]) -> Result<Vec<Assignment>, AppError> {
        let assignments = sqlx::query_as::<_, Assignment>(
            "SELECT * FROM work_order_executors WHERE work_order_id = ANY($1) ORDER BY work_order_id, id",
        )
        .bind(work_order_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }

    async fn list_assignments_by_executor(&self, executor_id: i64) -> Result<Vec<Assignment>, AppError> {
        let assignments = sqlx::query_as::<_, Assignment>(
            "SELECT * FROM work_order_executors WHERE executor_id = $1 ORDER BY created_at, id",
        )
        .bind(executor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }

    async fn find_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError> {
        let assignment = sqlx::query_as::<_, Assignment>("SELECT * FROM work_order_executors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(assignment)
    }

    async fn replace_unpaid_assignments(
        &self,
        work_order_id: i64,
        work_type: WorkType,
        assignments: Vec<CandidateAssignment>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Pagas ficam: são histórico
        sqlx::query(
            r#"
            DELETE FROM work_order_executors
            WHERE work_order_id = $1 AND work_type = $2 AND is_paid = FALSE
            "#,
        )
        .bind(work_order_id)
        .bind(work_type)
        .execute(&mut *tx)
        .await?;

        for candidate in &assignments {
            insert_assignment(&mut *tx, work_order_id, candidate).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn reprice_assignments(
        &self,
        work_order_id: i64,
        work_type: WorkType,
        amount: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE work_order_executors SET amount = $3
            WHERE work_order_id = $1 AND work_type = $2
            "#,
        )
        .bind(work_order_id)
        .bind(work_type)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_assignment_metadata(&self, id: i64, metadata: &TaskMetadata) -> Result<Assignment, AppError> {
        sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE work_order_executors SET metadata = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(metadata))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("assignment {}", id)))
    }

    async fn add_payment(&self, id: i64, amount: Decimal) -> Result<Option<Assignment>, AppError> {
        // O SET enxerga a linha antiga: paid_amount + $2 é o novo total pago
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE work_order_executors SET
                paid_amount = paid_amount + $2,
                is_paid = paid_amount + $2 >= amount
            WHERE id = $1 AND paid_amount + $2 <= amount
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }
}
