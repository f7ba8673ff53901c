// Built-in column catalog for AWS Cost and Usage Report (CUR) tables.
// Group order and column order are the order shown in the column picker.

use super::ColumnType::{self, Decimal, Json, Timestamp, Varchar};

pub const CUR_CATALOG_VERSION: &str = "cur-2024.1";

pub const CUR_TABLE_NAME: &str = "CUR";

pub fn cur_column_groups() -> Vec<(&'static str, Vec<(&'static str, ColumnType)>)> {
    vec![
        (
            "Identity",
            vec![
                ("identity_line_item_id", Varchar),
                ("identity_time_interval", Varchar),
            ],
        ),
        (
            "Bill",
            vec![
                ("bill_invoice_id", Varchar),
                ("bill_invoicing_entity", Varchar),
                ("bill_billing_entity", Varchar),
                ("bill_bill_type", Varchar),
                ("bill_payer_account_id", Varchar),
                ("bill_payer_account_name", Varchar),
                ("bill_billing_period_start_date", Timestamp),
                ("bill_billing_period_end_date", Timestamp),
            ],
        ),
        (
            "Line Item",
            vec![
                ("line_item_usage_account_id", Varchar),
                ("line_item_usage_account_name", Varchar),
                ("line_item_line_item_type", Varchar),
                ("line_item_usage_start_date", Timestamp),
                ("line_item_usage_end_date", Timestamp),
                ("line_item_product_code", Varchar),
                ("line_item_usage_type", Varchar),
                ("line_item_operation", Varchar),
                ("line_item_availability_zone", Varchar),
                ("line_item_resource_id", Varchar),
                ("line_item_usage_amount", Decimal),
                ("line_item_normalization_factor", Decimal),
                ("line_item_normalized_usage_amount", Decimal),
                ("line_item_currency_code", Varchar),
                ("line_item_unblended_rate", Decimal),
                ("line_item_unblended_cost", Decimal),
                ("line_item_blended_rate", Decimal),
                ("line_item_blended_cost", Decimal),
                ("line_item_line_item_description", Varchar),
                ("line_item_tax_type", Varchar),
                ("line_item_legal_entity", Varchar),
            ],
        ),
        (
            "Pricing",
            vec![
                ("pricing_currency", Varchar),
                ("pricing_lease_contract_length", Varchar),
                ("pricing_offering_class", Varchar),
                ("pricing_public_on_demand_cost", Decimal),
                ("pricing_public_on_demand_rate", Decimal),
                ("pricing_purchase_option", Varchar),
                ("pricing_rate_code", Varchar),
                ("pricing_rate_id", Varchar),
                ("pricing_term", Varchar),
                ("pricing_unit", Varchar),
            ],
        ),
        (
            "Product",
            vec![
                ("product_product_name", Varchar),
                ("product_product_family", Varchar),
                ("product_servicecode", Varchar),
                ("product_region", Varchar),
                ("product_region_code", Varchar),
                ("product_location", Varchar),
                ("product_location_type", Varchar),
                ("product_instance_type", Varchar),
                ("product_instance_type_family", Varchar),
                ("product_operating_system", Varchar),
                ("product_tenancy", Varchar),
                ("product_vcpu", Varchar),
                ("product_memory", Varchar),
                ("product_storage", Varchar),
                ("product_sku", Varchar),
                ("product", Json),
            ],
        ),
        (
            "Reservation",
            vec![
                ("reservation_reservation_a_r_n", Varchar),
                ("reservation_effective_cost", Decimal),
                ("reservation_amortized_upfront_cost_for_usage", Decimal),
                ("reservation_recurring_fee_for_usage", Decimal),
                ("reservation_unused_amortized_upfront_fee_for_billing_period", Decimal),
                ("reservation_unused_recurring_fee", Decimal),
                ("reservation_start_time", Timestamp),
                ("reservation_end_time", Timestamp),
            ],
        ),
        (
            "Savings Plan",
            vec![
                ("savings_plan_savings_plan_a_r_n", Varchar),
                ("savings_plan_savings_plan_effective_cost", Decimal),
                ("savings_plan_savings_plan_rate", Decimal),
                ("savings_plan_used_commitment", Decimal),
                ("savings_plan_total_commitment_to_date", Decimal),
                ("savings_plan_offering_type", Varchar),
                ("savings_plan_payment_option", Varchar),
                ("savings_plan_start_time", Timestamp),
                ("savings_plan_end_time", Timestamp),
            ],
        ),
        (
            "Discount",
            vec![
                ("discount_total_discount", Decimal),
                ("discount_bundled_discount", Decimal),
            ],
        ),
        (
            "Cost Category & Tags",
            vec![
                ("cost_category", Json),
                ("resource_tags", Json),
            ],
        ),
    ]
}
