// ==========================================
// 订单运营后台 - 商户/顾客数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑,只做 CRUD
// 策略: get-or-create,"先写者胜",命中时不合并默认值
// ==========================================

use crate::domain::{Client, Customer, NewClient, NewCustomer};
use crate::repository::error::RepositoryResult;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

/// 读取 TEXT 列中的 UUID
pub(crate) fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(s) => Uuid::parse_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(Uuid::nil()),
    }
}

const CLIENT_COLUMNS: &str =
    "id, uuid, email, shop, first_name, last_name, is_active, created_at, updated_at";

pub(crate) fn map_client(row: &Row<'_>) -> rusqlite::Result<Client> {
    map_client_at(row, 0)
}

/// 从第 base 列起读取商户字段(用于联表查询)
pub(crate) fn map_client_at(row: &Row<'_>, base: usize) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(base)?,
        uuid: uuid_column(row, base + 1)?,
        email: row.get(base + 2)?,
        shop: row.get(base + 3)?,
        first_name: row.get(base + 4)?,
        last_name: row.get(base + 5)?,
        is_active: row.get::<_, i64>(base + 6)? != 0,
        created_at: row.get(base + 7)?,
        updated_at: row.get(base + 8)?,
    })
}

// ==========================================
// ClientRepository - 商户仓储
// ==========================================
pub struct ClientRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ClientRepository<'c> {
    /// 从已有连接(或事务/保存点)创建仓储实例
    pub fn from_connection(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE email = ?1", CLIENT_COLUMNS);
        let client = self
            .conn
            .query_row(&sql, params![email], map_client)
            .optional()?;
        Ok(client)
    }

    pub fn insert(&self, draft: &NewClient) -> RepositoryResult<Client> {
        let now = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO clients (
                uuid, email, shop, first_name, last_name, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
            params![
                Uuid::new_v4().to_string(),
                draft.email,
                draft.shop,
                draft.first_name,
                draft.last_name,
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        let sql = format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS);
        Ok(self.conn.query_row(&sql, params![id], map_client)?)
    }

    /// 按 email 获取或创建
    ///
    /// # 返回
    /// - (Client, true): 新建
    /// - (Client, false): 已存在,原样返回
    /// - Err(UniqueConstraintViolation): 例如 shop 已被其他商户占用
    pub fn get_or_create(&self, draft: &NewClient) -> RepositoryResult<(Client, bool)> {
        if let Some(existing) = self.find_by_email(&draft.email)? {
            debug!(email = %draft.email, client_id = existing.id, "商户已存在");
            return Ok((existing, false));
        }

        let client = self.insert(draft)?;
        debug!(email = %draft.email, client_id = client.id, "商户已创建");
        Ok((client, true))
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?)
    }
}

// ==========================================
// CustomerRepository - 顾客仓储
// ==========================================
const CUSTOMER_COLUMNS: &str =
    "id, uuid, name, last_name, email, location, client_id, created_at, updated_at";

fn map_customer(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        uuid: uuid_column(row, 1)?,
        name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        location: row.get(5)?,
        client_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub struct CustomerRepository<'c> {
    conn: &'c Connection,
}

impl<'c> CustomerRepository<'c> {
    pub fn from_connection(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 按业务键 (email, client_id) 查询
    pub fn find_by_key(&self, email: &str, client_id: i64) -> RepositoryResult<Option<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers WHERE email = ?1 AND client_id = ?2",
            CUSTOMER_COLUMNS
        );
        let customer = self
            .conn
            .query_row(&sql, params![email, client_id], map_customer)
            .optional()?;
        Ok(customer)
    }

    pub fn list_by_client(&self, client_id: i64) -> RepositoryResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers WHERE client_id = ?1 ORDER BY created_at DESC, id DESC",
            CUSTOMER_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let customers = stmt
            .query_map(params![client_id], map_customer)?
            .collect::<rusqlite::Result<Vec<Customer>>>()?;
        Ok(customers)
    }

    pub fn insert(&self, draft: &NewCustomer) -> RepositoryResult<Customer> {
        let now = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO customers (
                uuid, name, last_name, email, location, client_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                Uuid::new_v4().to_string(),
                draft.name,
                draft.last_name,
                draft.email,
                draft.location,
                draft.client_id,
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
        Ok(self.conn.query_row(&sql, params![id], map_customer)?)
    }

    pub fn get_or_create(&self, draft: &NewCustomer) -> RepositoryResult<(Customer, bool)> {
        if let Some(existing) = self.find_by_key(&draft.email, draft.client_id)? {
            return Ok((existing, false));
        }

        let customer = self.insert(draft)?;
        debug!(email = %draft.email, client_id = draft.client_id, "顾客已创建");
        Ok((customer, true))
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?)
    }
}
