//! # Report Module
//!
//! Read-only renderings of recorded sales: the printable receipt and the
//! CSV export an admin downloads.

use chrono::{DateTime, Utc};

use crate::types::{SaleEntry, StoreCategory};

const RULE: &str = "==============================";

/// Column headers of the sales export, in order.
pub const EXPORT_HEADERS: [&str; 8] = [
    "Date",
    "Product",
    "Quantity",
    "Unit Price",
    "Total",
    "Customer",
    "Employee",
    "Payment",
];

/// Renders the plain-text receipt of one sale.
pub fn render_receipt(entry: &SaleEntry) -> String {
    let sale = &entry.sale;

    [
        "SALE RECEIPT".to_string(),
        RULE.to_string(),
        format!("Store: {}", sale.store_category.as_str().to_uppercase()),
        format!("Date: {}", sale.created_at.format("%d/%m/%Y %H:%M")),
        format!("Recorded by: {}", entry.recorder_name),
        String::new(),
        format!("PRODUCT: {}", sale.product_name),
        format!("Quantity: {}", sale.quantity),
        format!("Unit price: {}", sale.unit_price()),
        format!("TOTAL: {}", sale.total()),
        format!("Payment: {}", sale.payment_type.label()),
        String::new(),
        format!("Customer: {}", sale.customer_name),
        format!("Phone: {}", sale.customer_phone),
        String::new(),
        "Thank you for your purchase!".to_string(),
        RULE.to_string(),
    ]
    .join("\n")
        + "\n"
}

/// File name offered for an export generated at `now`.
pub fn export_file_name(category: StoreCategory, now: DateTime<Utc>) -> String {
    format!("sales-{}-{}.csv", category, now.format("%Y%m%d"))
}

/// Writes the sales export as CSV bytes (UTF-8, header row first).
pub fn export_sales_csv(entries: &[SaleEntry]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for entry in entries {
        let sale = &entry.sale;
        writer.write_record([
            sale.created_at.format("%d/%m/%Y").to_string(),
            sale.product_name.clone(),
            sale.quantity.to_string(),
            sale.unit_price().to_decimal_string(),
            sale.total().to_decimal_string(),
            sale.customer_name.clone(),
            entry.recorder_name.clone(),
            sale.payment_type.label().to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentType, Sale};
    use chrono::TimeZone;

    fn entry(customer: &str) -> SaleEntry {
        SaleEntry {
            sale: Sale {
                id: "sale-1".to_string(),
                product_id: "prod-1".to_string(),
                owner_id: "admin-1".to_string(),
                recorded_by: "emp-1".to_string(),
                product_name: "Oak table".to_string(),
                store_category: StoreCategory::Furniture,
                quantity: 3,
                unit_price_cents: 10_000,
                total_cents: 30_000,
                customer_name: customer.to_string(),
                customer_phone: "5551234".to_string(),
                payment_type: PaymentType::Cash,
                created_at: Utc.with_ymd_and_hms(2024, 3, 7, 15, 4, 0).unwrap(),
            },
            recorder_name: "Clerk".to_string(),
        }
    }

    #[test]
    fn test_receipt_contents() {
        let text = render_receipt(&entry("Ana"));
        assert!(text.starts_with("SALE RECEIPT\n"));
        assert!(text.contains("Store: FURNITURE"));
        assert!(text.contains("Date: 07/03/2024 15:04"));
        assert!(text.contains("Recorded by: Clerk"));
        assert!(text.contains("Unit price: $100.00"));
        assert!(text.contains("TOTAL: $300.00"));
        assert!(text.contains("Phone: 5551234"));
    }

    #[test]
    fn test_export_csv() {
        let bytes = export_sales_csv(&[entry("Ana"), entry("Lopez, Jose")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Date,Product,Quantity,Unit Price,Total,Customer,Employee,Payment"
        );
        assert_eq!(lines[1], "07/03/2024,Oak table,3,100.00,300.00,Ana,Clerk,Cash");
        assert_eq!(
            lines[2],
            "07/03/2024,Oak table,3,100.00,300.00,\"Lopez, Jose\",Clerk,Cash"
        );
    }

    #[test]
    fn test_export_empty_has_header_only() {
        let text = String::from_utf8(export_sales_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_export_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap();
        assert_eq!(
            export_file_name(StoreCategory::Beverage, now),
            "sales-beverage-20240307.csv"
        );
    }
}
