/// renewal quote - price an overdue motorcycle renewal as the clock moves
use chrono::{Duration, TimeZone, Utc};
use vehicle_renewal_rs::{
    CalculateRequest, EngineConfig, FuelType, RateBook, RenewalCalculator, SafeTimeProvider,
    TimeSource, Uuid, VehicleSnapshot, VehicleType,
};

const TABLES: &str = r#"{
    "fiscal_years": [
        {"id": 1, "label": "2079/80", "start_date": "2022-07-17", "end_date": "2023-07-16"},
        {"id": 2, "label": "2080/81", "start_date": "2023-07-17", "end_date": "2024-07-15"},
        {"id": 3, "label": "2081/82", "start_date": "2024-07-16", "end_date": "2025-07-15", "is_current": true}
    ],
    "tax_rates": [
        {"fiscal_year_id": 1, "vehicle_type": "2W", "fuel_type": "Petrol", "capacity": 125, "amount": "3000"},
        {"fiscal_year_id": 2, "vehicle_type": "2W", "fuel_type": "Petrol", "capacity": 125, "amount": "3000"},
        {"fiscal_year_id": 3, "province_id": 3, "vehicle_type": "2W", "fuel_type": "Petrol", "capacity": 125, "amount": "3500"}
    ],
    "insurance_rates": [
        {"fiscal_year_id": 3, "vehicle_type": "2W", "fuel_type": "Petrol", "capacity": 150, "premium": "1705"}
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== renewal quote example ===\n");

    let book = RateBook::from_json(TABLES)?;
    let config = EngineConfig::nepal();
    let calculator = RenewalCalculator::new(&book, &config);

    let vehicle = VehicleSnapshot {
        id: Uuid::new_v4(),
        capacity: 125,
        vehicle_type: VehicleType::TwoWheeler,
        fuel_type: FuelType::Petrol,
        province_id: 3,
        last_renewed_date_bs: Some("2079-01-01".to_string()),
        registration_date_bs: "2076-03-15".to_string(),
        cached_expiry_date_ad: None,
        is_verified: true,
    };
    let request = CalculateRequest::new(vehicle);

    // start one day before the first renewal falls due
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2023, 4, 13, 6, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    for step in [0, 91, 30, 60, 365] {
        controller.advance(Duration::days(step));
        let result = calculator.calculate(&request, &time)?;
        println!(
            "{} ({}): {} year(s) owed, penalties {}, total Rs. {}",
            result.vehicle_info.today_ad,
            result.vehicle_info.today_bs,
            result.summary.years_count,
            result.summary.total_penalty_amount,
            result.summary.total_amount
        );
    }

    println!("\nfinal quote:");
    println!("{}", calculator.calculate(&request, &time)?.to_json_pretty()?);

    Ok(())
}
