use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CarIn {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: i64,
    pub price_per_hour: i64,
    pub fuel_type: String,
    pub transmission: String,
    pub seats: i32,
    #[serde(default = "default_is_available")]
    pub is_available: bool,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

fn default_is_available() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CarUpdateIn {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price_per_day: Option<i64>,
    pub price_per_hour: Option<i64>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub seats: Option<i32>,
    pub is_available: Option<bool>,
    pub rating: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CarOut {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: i64,
    pub price_per_hour: i64,
    pub fuel_type: String,
    pub transmission: String,
    pub seats: i32,
    pub is_available: bool,
    pub booking_count: i64,
    pub rating: f64,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CarBrief {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CarListOut {
    pub cars: Vec<CarOut>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityOut {
    pub car_id: String,
    pub available: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

// Shared by order creation and payment verification.
#[derive(Debug, Deserialize, Clone)]
pub struct BookingForm {
    pub car_id: String,
    #[serde(default = "default_booking_type")]
    pub booking_type: String,
    pub start_date: String, // YYYY-MM-DD
    pub end_date: String,   // YYYY-MM-DD
    pub start_time: Option<String>, // HH:MM, hourly only
    pub end_time: Option<String>,   // HH:MM, hourly only
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
}

fn default_booking_type() -> String {
    "daily".to_string()
}

#[derive(Debug, Serialize)]
pub struct OrderOut {
    pub order_id: String,
    pub amount: i64, // minor currency units
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentReq {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub booking: BookingForm,
}

#[derive(Debug, Serialize, Clone)]
pub struct BookingOut {
    pub id: String,
    pub booking_ref: String,
    pub car_id: String,
    pub user_id: String,
    pub user_name: String,
    pub booking_type: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub duration: i64,
    pub total_amount: i64,
    pub status: String,
    pub payment_status: String,
    pub payment_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub car: Option<CarBrief>,
}

#[derive(Debug, Serialize)]
pub struct BookingListOut {
    pub bookings: Vec<BookingOut>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusIn {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MonthlyStatOut {
    pub month: u32,
    pub bookings: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardOut {
    pub cars_total: i64,
    pub users_total: i64,
    pub bookings_total: i64,
    pub bookings_active: i64,
    pub revenue_total: i64,
    pub recent_bookings: Vec<BookingOut>,
    pub year: i32,
    pub monthly: Vec<MonthlyStatOut>,
}
