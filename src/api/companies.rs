// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sample investments data, filtered by the caller's business claims.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::auth::Auth;
use crate::claims::{ClaimsPrincipal, SampleExtraClaims};
use crate::errors::{codes, ApiError, ClientError};
use crate::logging::LogEntry;

/// Scope required to read company data.
pub const TRANSACTIONS_SCOPE: &str = "transactions";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: u32,
    pub name: String,
    pub region: String,
    pub target_usd: u64,
    pub investment_usd: u64,
    pub no_investors: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub investor_id: String,
    pub amount_usd: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyTransactions {
    pub id: u32,
    pub company: Company,
    pub transactions: Vec<Transaction>,
}

fn company(id: u32, name: &str, region: &str, target_usd: u64, investment_usd: u64, no_investors: u32) -> Company {
    Company {
        id,
        name: name.to_string(),
        region: region.to_string(),
        target_usd,
        investment_usd,
        no_investors,
    }
}

fn all_companies() -> Vec<Company> {
    vec![
        company(1, "Company 1", "Europe", 40_000, 20_000, 23),
        company(2, "Company 2", "USA", 90_000, 60_000, 37),
        company(3, "Company 3", "USA", 55_000, 31_000, 14),
        company(4, "Company 4", "Asia", 120_000, 75_000, 52),
    ]
}

fn all_transactions(company_id: u32) -> Vec<Transaction> {
    (1..=3u64)
        .map(|n| Transaction {
            id: format!("{company_id}{n:02}"),
            investor_id: format!("{}", 10_000 + u64::from(company_id) * 100 + n),
            amount_usd: 1_000 * n * u64::from(company_id),
        })
        .collect()
}

/// Admins see every company, users see their regions, other roles see none.
fn is_authorized_for(principal: &ClaimsPrincipal<SampleExtraClaims>, company: &Company) -> bool {
    let claims = principal.extra();
    if claims.is_admin() {
        return true;
    }
    claims.is_user() && claims.regions.iter().any(|r| *r == company.region)
}

pub async fn list_companies(Auth(principal): Auth) -> Result<Json<Vec<Company>>, ApiError> {
    principal.require_scope(TRANSACTIONS_SCOPE)?;

    let companies = all_companies()
        .into_iter()
        .filter(|company| is_authorized_for(&principal, company))
        .collect();
    Ok(Json(companies))
}

pub async fn get_company_transactions(
    Auth(principal): Auth,
    Extension(entry): Extension<LogEntry>,
    Path(company_id): Path<String>,
) -> Result<Json<CompanyTransactions>, ApiError> {
    entry.set_operation_name("getCompanyTransactions");
    principal.require_scope(TRANSACTIONS_SCOPE)?;

    let id = match company_id.parse::<u32>() {
        Ok(id) if id > 0 => id,
        _ => {
            return Err(ClientError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_COMPANY_ID,
                "The company ID must be a positive numeric integer",
            )
            .into())
        }
    };

    let mut span = entry.create_performance_breakdown("selectCompanyTransactions");
    span.set_details(json!({ "companyId": id }));

    let company = all_companies()
        .into_iter()
        .find(|company| company.id == id)
        .filter(|company| is_authorized_for(&principal, company));
    span.close();

    match company {
        Some(company) => Ok(Json(CompanyTransactions {
            id,
            transactions: all_transactions(id),
            company,
        })),
        // Unauthorized items are reported as missing.
        None => Err(ClientError::new(
            StatusCode::NOT_FOUND,
            codes::COMPANY_NOT_FOUND,
            format!("Transactions for company {id} were not found for this user"),
        )
        .into()),
    }
}
