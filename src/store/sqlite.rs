use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, VitrineError};
use crate::domain::{
    ClickEvent, Gift, GiftPricing, NewClick, NewGift, NewOffer, Offer, OfferSnapshot,
    PriceHistoryEntry,
};
use crate::store::{Records, Store};

const GIFT_COLUMNS: &str = "id, registry_id, title, description, image_url, category, price_cents, \
     currency, primary_offer_id, desired_quantity, allow_contributions, created_at";

const OFFER_COLUMNS: &str = "id, gift_id, store_name, domain, title, url, canonical_url, image_url, \
     price_cents, currency, is_primary, attributes, last_checked_at, created_at";

const PRICE_ORDER: &str = "price_cents IS NULL, price_cents ASC, created_at ASC, id ASC";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            VitrineError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }
}

impl Store for SqliteStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Records) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&SqliteRecords { conn: &*conn })
    }

    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Records) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        // Dropping `tx` on the error path rolls back.
        let value = f(&SqliteRecords { conn: &*tx })?;
        tx.commit()?;
        Ok(value)
    }
}

/// [`Records`] over a borrowed connection or open transaction.
pub struct SqliteRecords<'c> {
    conn: &'c Connection,
}

impl Records for SqliteRecords<'_> {
    fn insert_gift(&self, gift: &NewGift) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO gifts (registry_id, title, description, image_url, category,
                                desired_quantity, allow_contributions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                gift.registry_id,
                gift.title,
                gift.description,
                gift.image_url,
                gift.category,
                gift.desired_quantity,
                gift.allow_contributions,
                ts(&gift.created_at)
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_gift(&self, id: i64) -> Result<Option<Gift>> {
        let gift = self
            .conn
            .query_row(
                &format!("SELECT {GIFT_COLUMNS} FROM gifts WHERE id = ?1"),
                params![id],
                gift_from_row,
            )
            .optional()?;

        Ok(gift)
    }

    fn gifts_for_registry(&self, registry_id: &str) -> Result<Vec<Gift>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GIFT_COLUMNS} FROM gifts WHERE registry_id = ?1 ORDER BY created_at ASC, id ASC"
        ))?;

        let gifts = stmt
            .query_map(params![registry_id], gift_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(gifts)
    }

    fn set_gift_pricing(&self, gift_id: i64, pricing: Option<&GiftPricing>) -> Result<()> {
        match pricing {
            Some(p) => self.conn.execute(
                "UPDATE gifts SET primary_offer_id = ?1, price_cents = ?2, currency = ?3
                 WHERE id = ?4",
                params![p.offer_id, p.price_cents, p.currency, gift_id],
            )?,
            None => self.conn.execute(
                "UPDATE gifts SET primary_offer_id = NULL, price_cents = NULL, currency = NULL
                 WHERE id = ?1",
                params![gift_id],
            )?,
        };

        Ok(())
    }

    fn insert_offer(&self, offer: &NewOffer) -> Result<i64> {
        let snap = &offer.snapshot;
        let attributes = serde_json::to_string(&snap.attributes)?;
        let created_at = ts(&offer.created_at);

        self.conn.execute(
            "INSERT INTO offers (gift_id, store_name, domain, title, url, canonical_url, image_url,
                                 price_cents, currency, is_primary, attributes,
                                 last_checked_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                offer.gift_id,
                snap.store_name,
                snap.domain,
                snap.title,
                offer.url,
                snap.canonical_url,
                snap.image_url,
                snap.price_cents,
                snap.currency,
                offer.is_primary,
                attributes,
                created_at
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_offer(&self, id: i64) -> Result<Option<Offer>> {
        let offer = self
            .conn
            .query_row(
                &format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = ?1"),
                params![id],
                offer_from_row,
            )
            .optional()?;

        Ok(offer)
    }

    fn update_offer_snapshot(
        &self,
        id: i64,
        snapshot: &OfferSnapshot,
        checked_at: DateTime<Utc>,
    ) -> Result<()> {
        let attributes = serde_json::to_string(&snapshot.attributes)?;

        self.conn.execute(
            "UPDATE offers SET store_name = ?1, domain = ?2, title = ?3, canonical_url = ?4,
                               image_url = ?5, price_cents = ?6, currency = ?7,
                               attributes = ?8, last_checked_at = ?9
             WHERE id = ?10",
            params![
                snapshot.store_name,
                snapshot.domain,
                snapshot.title,
                snapshot.canonical_url,
                snapshot.image_url,
                snapshot.price_cents,
                snapshot.currency,
                attributes,
                ts(&checked_at),
                id
            ],
        )?;

        Ok(())
    }

    fn delete_offer(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM offers WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn offers_by_price(&self, gift_id: i64) -> Result<Vec<Offer>> {
        self.query_offers(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE gift_id = ?1 ORDER BY {PRICE_ORDER}"
        ), gift_id)
    }

    fn offers_for_display(&self, gift_id: i64) -> Result<Vec<Offer>> {
        self.query_offers(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE gift_id = ?1
             ORDER BY is_primary DESC, {PRICE_ORDER}"
        ), gift_id)
    }

    fn set_primary_offer(&self, gift_id: i64, offer_id: i64) -> Result<()> {
        // Two statements: the partial unique index forbids two primaries even
        // transiently within one UPDATE.
        self.conn.execute(
            "UPDATE offers SET is_primary = 0 WHERE gift_id = ?1 AND is_primary = 1",
            params![gift_id],
        )?;
        self.conn.execute(
            "UPDATE offers SET is_primary = 1 WHERE id = ?1 AND gift_id = ?2",
            params![offer_id, gift_id],
        )?;

        Ok(())
    }

    fn append_price(
        &self,
        offer_id: i64,
        price_cents: i64,
        currency: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO price_history (offer_id, price_cents, currency, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![offer_id, price_cents, currency, ts(&recorded_at)],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn price_history(&self, offer_id: i64, limit: usize) -> Result<Vec<PriceHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, offer_id, price_cents, currency, recorded_at
             FROM price_history WHERE offer_id = ?1
             ORDER BY recorded_at DESC, id DESC
             LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![offer_id, limit as i64], |row| {
                Ok(PriceHistoryEntry {
                    id: row.get(0)?,
                    offer_id: row.get(1)?,
                    price_cents: row.get(2)?,
                    currency: row.get(3)?,
                    recorded_at: datetime_column(row, 4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn insert_click(&self, click: &NewClick) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO click_events (gift_id, offer_id, ip, user_agent, clicked_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                click.gift_id,
                click.offer_id,
                click.ip,
                click.user_agent,
                ts(&click.clicked_at)
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn recent_clicks(&self, gift_id: i64, limit: usize) -> Result<Vec<ClickEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, gift_id, offer_id, ip, user_agent, clicked_at
             FROM click_events WHERE gift_id = ?1
             ORDER BY clicked_at DESC, id DESC
             LIMIT ?2",
        )?;

        let clicks = stmt
            .query_map(params![gift_id, limit as i64], |row| {
                Ok(ClickEvent {
                    id: row.get(0)?,
                    gift_id: row.get(1)?,
                    offer_id: row.get(2)?,
                    ip: row.get(3)?,
                    user_agent: row.get(4)?,
                    clicked_at: datetime_column(row, 5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(clicks)
    }

    fn click_counts_since(&self, gift_id: i64, since: DateTime<Utc>) -> Result<HashMap<i64, i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT offer_id, COUNT(*) FROM click_events
             WHERE gift_id = ?1 AND clicked_at >= ?2
             GROUP BY offer_id",
        )?;

        let counts = stmt
            .query_map(params![gift_id, ts(&since)], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        Ok(counts)
    }
}

impl SqliteRecords<'_> {
    fn query_offers(&self, sql: &str, gift_id: i64) -> Result<Vec<Offer>> {
        let mut stmt = self.conn.prepare(sql)?;
        let offers = stmt
            .query_map(params![gift_id], offer_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(offers)
    }
}

/// Fixed-width UTC so that text comparison in SQL matches time order.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| s.parse::<DateTime<Utc>>().ok())
}

fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn gift_from_row(row: &Row<'_>) -> rusqlite::Result<Gift> {
    Ok(Gift {
        id: row.get(0)?,
        registry_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        image_url: row.get(4)?,
        category: row.get(5)?,
        price_cents: row.get(6)?,
        currency: row.get(7)?,
        primary_offer_id: row.get(8)?,
        desired_quantity: row.get(9)?,
        allow_contributions: row.get(10)?,
        created_at: datetime_column(row, 11)?,
    })
}

fn offer_from_row(row: &Row<'_>) -> rusqlite::Result<Offer> {
    Ok(Offer {
        id: row.get(0)?,
        gift_id: row.get(1)?,
        store_name: row.get(2)?,
        domain: row.get(3)?,
        title: row.get(4)?,
        url: row.get(5)?,
        canonical_url: row.get(6)?,
        image_url: row.get(7)?,
        price_cents: row.get(8)?,
        currency: row.get(9)?,
        is_primary: row.get(10)?,
        attributes: row
            .get::<_, String>(11)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        last_checked_at: datetime_column(row, 12)?,
        created_at: datetime_column(row, 13)?,
    })
}
