//! Metrics and report DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use domain_analytics::DailyMetrics;
use domain_billing::{AccountingReport, MethodTotal, PaymentMethod};

use super::folio::PaymentResponse;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub date: NaiveDate,
    pub total_rooms: u32,
    pub occupied_rooms: u32,
    pub available_rooms: u32,
    pub occupancy_rate: Decimal,
    pub total_revenue: Decimal,
    pub currency: String,
    pub guest_count: u32,
    pub check_ins: u32,
    pub check_outs: u32,
    pub cancellations: u32,
}

impl From<&DailyMetrics> for MetricsResponse {
    fn from(metrics: &DailyMetrics) -> Self {
        Self {
            date: metrics.date,
            total_rooms: metrics.total_rooms,
            occupied_rooms: metrics.occupied_rooms,
            available_rooms: metrics.available_rooms,
            occupancy_rate: metrics.occupancy_rate,
            total_revenue: metrics.total_revenue.amount(),
            currency: metrics.total_revenue.currency().code().to_string(),
            guest_count: metrics.guest_count,
            check_ins: metrics.check_ins,
            check_outs: metrics.check_outs,
            cancellations: metrics.cancellations,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountingQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MethodTotalResponse {
    pub method: PaymentMethod,
    pub count: usize,
    pub total: Decimal,
}

impl From<&MethodTotal> for MethodTotalResponse {
    fn from(total: &MethodTotal) -> Self {
        Self {
            method: total.method,
            count: total.count,
            total: total.total.amount(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub currency: String,
    pub total_revenue: Decimal,
    pub by_method: Vec<MethodTotalResponse>,
    pub payments: Vec<PaymentResponse>,
}

impl From<&AccountingReport> for ReportResponse {
    fn from(report: &AccountingReport) -> Self {
        Self {
            start: report.start,
            end: report.end,
            currency: report.total_revenue.currency().code().to_string(),
            total_revenue: report.total_revenue.amount(),
            by_method: report.by_method.iter().map(Into::into).collect(),
            payments: report.payments.iter().map(Into::into).collect(),
        }
    }
}
