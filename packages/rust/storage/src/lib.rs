//! libSQL storage layer for companies and contacts.
//!
//! The [`Store`] struct wraps a local libSQL database. It is the single
//! persistence collaborator of the discovery pipeline: company lifecycle
//! status lives here and is the pipeline's only cache-control signal.
//!
//! **Access rules:**
//! - CLI / discovery pipeline: read-write via [`Store::open`]
//! - reporting/debug tooling: read-only via [`Store::open_readonly`]

mod migrations;

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use libsql::{Connection, Database, params};

use leadscout_shared::{
    Company, CompanyId, CompanyProfile, CompanyStatus, Contact, LeadScoutError, Result,
};

/// Primary storage handle wrapping a libSQL database.
pub struct Store {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Store {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LeadScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        let store = Self {
            db,
            conn,
            readonly: false,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    LeadScoutError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(LeadScoutError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Company operations
    // -----------------------------------------------------------------------

    /// Get a company by name, creating a `pending` record when absent.
    ///
    /// An existing record gets missing `local_name`/`country` backfilled from
    /// the arguments; populated fields are never overwritten here.
    pub async fn get_or_create_company(
        &self,
        name: &str,
        local_name: Option<&str>,
        country: Option<&str>,
    ) -> Result<Company> {
        if let Some(mut company) = self.get_company_by_name(name).await? {
            let mut dirty = false;
            if company.local_name.is_none() {
                if let Some(local) = local_name.filter(|l| !l.trim().is_empty()) {
                    company.local_name = Some(local.to_string());
                    dirty = true;
                }
            }
            if company.country.is_none() {
                if let Some(country) = country.filter(|c| !c.trim().is_empty()) {
                    company.country = Some(country.to_string());
                    dirty = true;
                }
            }
            if dirty {
                self.check_writable()?;
                let now = Utc::now();
                self.conn
                    .execute(
                        "UPDATE companies SET local_name = ?1, country = ?2, updated_at = ?3
                         WHERE id = ?4",
                        params![
                            company.local_name.as_deref(),
                            company.country.as_deref(),
                            now.to_rfc3339(),
                            company.id.to_string(),
                        ],
                    )
                    .await
                    .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
                company.updated_at = now;
            }
            return Ok(company);
        }

        self.check_writable()?;
        let now = Utc::now();
        let company = Company {
            id: CompanyId::new(),
            name: name.to_string(),
            local_name: local_name
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string),
            country: country
                .filter(|c| !c.trim().is_empty())
                .map(str::to_string),
            domain: None,
            industry: None,
            positioning: None,
            brief: None,
            public_emails: Vec::new(),
            status: CompanyStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.conn
            .execute(
                "INSERT INTO companies
                   (id, name, local_name, country, public_emails, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, '[]', ?5, ?6, ?7)",
                params![
                    company.id.to_string(),
                    company.name.as_str(),
                    company.local_name.as_deref(),
                    company.country.as_deref(),
                    company.status.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        Ok(company)
    }

    /// Get a company by its unique name.
    pub async fn get_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE name = ?1"),
                params![name],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_company(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LeadScoutError::Storage(e.to_string())),
        }
    }

    /// Get a company by id.
    pub async fn get_company_by_id(&self, id: &CompanyId) -> Result<Option<Company>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_company(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LeadScoutError::Storage(e.to_string())),
        }
    }

    /// List all companies ordered by name.
    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name"),
                params![],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        let mut companies = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            companies.push(row_to_company(&row)?);
        }
        Ok(companies)
    }

    /// Overwrite a company's profile fields.
    pub async fn update_company_profile(
        &self,
        id: &CompanyId,
        profile: &CompanyProfile,
    ) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "UPDATE companies
                 SET domain = ?1, industry = ?2, positioning = ?3, brief = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    profile.domain.as_deref(),
                    profile.industry.as_deref(),
                    profile.positioning.as_deref(),
                    profile.brief.as_deref(),
                    Utc::now().to_rfc3339(),
                    id.to_string(),
                ],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Transition a company's lifecycle status.
    pub async fn set_company_status(&self, id: &CompanyId, status: CompanyStatus) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "UPDATE companies SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), Utc::now().to_rfc3339(), id.to_string()],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Merge new public emails into a company's list (union, deduplicated,
    /// first-seen order preserved).
    pub async fn merge_public_emails(&self, id: &CompanyId, emails: &[String]) -> Result<()> {
        self.check_writable()?;

        let company = self
            .get_company_by_id(id)
            .await?
            .ok_or_else(|| LeadScoutError::Storage(format!("company not found: {id}")))?;

        let mut merged = company.public_emails;
        for email in emails {
            if !merged.iter().any(|e| e.eq_ignore_ascii_case(email)) {
                merged.push(email.clone());
            }
        }

        let json = serde_json::to_string(&merged)
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
        self.conn
            .execute(
                "UPDATE companies SET public_emails = ?1, updated_at = ?2 WHERE id = ?3",
                params![json.as_str(), Utc::now().to_rfc3339(), id.to_string()],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Contact operations
    // -----------------------------------------------------------------------

    /// Insert a single contact.
    pub async fn insert_contact(&self, contact: &Contact) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO contacts
                   (id, company_id, full_name, email, role, department,
                    linkedin_url, twitter_url, source, confidence, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                contact_params(contact),
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Insert a batch of contacts atomically.
    ///
    /// Either every record lands or none does; callers that want partial
    /// persistence fall back to [`Store::insert_contact`] per record.
    pub async fn insert_contacts(&self, contacts: &[Contact]) -> Result<usize> {
        self.check_writable()?;
        if contacts.is_empty() {
            return Ok(0);
        }

        self.conn
            .execute("BEGIN", params![])
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        for contact in contacts {
            let inserted = self
                .conn
                .execute(
                    "INSERT INTO contacts
                       (id, company_id, full_name, email, role, department,
                        linkedin_url, twitter_url, source, confidence, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    contact_params(contact),
                )
                .await;

            if let Err(e) = inserted {
                let _ = self.conn.execute("ROLLBACK", params![]).await;
                return Err(LeadScoutError::Storage(format!(
                    "batch insert failed at contact {}: {e}",
                    contact.id
                )));
            }
        }

        self.conn
            .execute("COMMIT", params![])
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        Ok(contacts.len())
    }

    /// All contacts for a company, oldest first.
    pub async fn contacts_for_company(&self, company_id: &CompanyId) -> Result<Vec<Contact>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {CONTACT_COLUMNS} FROM contacts
                     WHERE company_id = ?1 ORDER BY created_at, id"
                ),
                params![company_id.to_string()],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        let mut contacts = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            contacts.push(row_to_contact(&row)?);
        }
        Ok(contacts)
    }

    /// Contacts with a non-empty email for a company.
    pub async fn contacts_with_email_for_company(
        &self,
        company_id: &CompanyId,
    ) -> Result<Vec<Contact>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {CONTACT_COLUMNS} FROM contacts
                     WHERE company_id = ?1 AND email IS NOT NULL AND email != ''
                     ORDER BY created_at, id"
                ),
                params![company_id.to_string()],
            )
            .await
            .map_err(|e| LeadScoutError::Storage(e.to_string()))?;

        let mut contacts = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            contacts.push(row_to_contact(&row)?);
        }
        Ok(contacts)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

const COMPANY_COLUMNS: &str = "id, name, local_name, country, domain, industry, positioning, \
                               brief, public_emails, status, created_at, updated_at";

const CONTACT_COLUMNS: &str = "id, company_id, full_name, email, role, department, linkedin_url, \
                               twitter_url, source, confidence, created_at";

fn contact_params(contact: &Contact) -> impl libsql::params::IntoParams {
    params![
        contact.id.to_string(),
        contact.company_id.to_string(),
        contact.full_name.as_deref(),
        contact.email.as_deref(),
        contact.role.as_deref(),
        contact.department.as_str(),
        contact.linkedin_url.as_deref(),
        contact.twitter_url.as_deref(),
        contact.source.as_str(),
        contact.confidence,
        contact.created_at.to_rfc3339(),
    ]
}

fn get_text(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| LeadScoutError::Storage(e.to_string()))
}

fn get_opt_text(row: &libsql::Row, idx: i32) -> Option<String> {
    row.get::<String>(idx).ok().filter(|s| !s.is_empty())
}

fn parse_timestamp(s: &str) -> Result<chrono::DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LeadScoutError::Storage(format!("invalid timestamp: {e}")))
}

/// Convert a database row to a [`Company`].
fn row_to_company(row: &libsql::Row) -> Result<Company> {
    let status_str = get_text(row, 9)?;
    let status = CompanyStatus::from_str(&status_str).map_err(LeadScoutError::Storage)?;

    let public_emails: Vec<String> = serde_json::from_str(&get_text(row, 8)?)
        .map_err(|e| LeadScoutError::Storage(format!("invalid public_emails JSON: {e}")))?;

    Ok(Company {
        id: get_text(row, 0)?
            .parse()
            .map_err(|e: uuid::Error| LeadScoutError::Storage(e.to_string()))?,
        name: get_text(row, 1)?,
        local_name: get_opt_text(row, 2),
        country: get_opt_text(row, 3),
        domain: get_opt_text(row, 4),
        industry: get_opt_text(row, 5),
        positioning: get_opt_text(row, 6),
        brief: get_opt_text(row, 7),
        public_emails,
        status,
        created_at: parse_timestamp(&get_text(row, 10)?)?,
        updated_at: parse_timestamp(&get_text(row, 11)?)?,
    })
}

/// Convert a database row to a [`Contact`].
fn row_to_contact(row: &libsql::Row) -> Result<Contact> {
    Ok(Contact {
        id: get_text(row, 0)?
            .parse()
            .map_err(|e: uuid::Error| LeadScoutError::Storage(e.to_string()))?,
        company_id: get_text(row, 1)?
            .parse()
            .map_err(|e: uuid::Error| LeadScoutError::Storage(e.to_string()))?,
        full_name: get_opt_text(row, 2),
        email: get_opt_text(row, 3),
        role: get_opt_text(row, 4),
        department: get_text(row, 5)?,
        linkedin_url: get_opt_text(row, 6),
        twitter_url: get_opt_text(row, 7),
        source: get_text(row, 8)?,
        confidence: row.get::<f64>(9).unwrap_or(0.0),
        created_at: parse_timestamp(&get_text(row, 10)?)?,
    })
}
