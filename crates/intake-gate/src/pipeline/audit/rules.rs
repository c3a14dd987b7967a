use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::super::domain::LineItem;
use super::super::normalizer::format_amount;
use super::report::{AuditCheck, CheckType, FailureSeverity};

/// `subtotal + vat` must match `total` within `tolerance`.
pub fn verify_totals(
    subtotal: Option<Decimal>,
    vat: Option<Decimal>,
    total: Option<Decimal>,
    tolerance: Decimal,
) -> AuditCheck {
    let (subtotal, vat, total) = match (subtotal, vat, total) {
        (None, None, None) => {
            return AuditCheck::pass(CheckType::Math, "total_amount", "no amounts to verify");
        }
        (Some(subtotal), Some(vat), Some(total)) => (subtotal, vat, total),
        _ => {
            return AuditCheck::pass(
                CheckType::Math,
                "total_amount",
                "totals check skipped: insufficient data",
            );
        }
    };

    let Some((expected, difference)) = subtotal
        .checked_add(vat)
        .and_then(|expected| Some((expected, expected.checked_sub(total)?.abs())))
    else {
        return AuditCheck::fail(
            CheckType::Math,
            "total_amount",
            FailureSeverity::Critical,
            "subtotal, vat and total are out of the representable range",
        )
        .with_hint("re-inspect the amounts printed on the source document");
    };
    if difference <= tolerance {
        return AuditCheck::pass(
            CheckType::Math,
            "total_amount",
            format!(
                "subtotal {} + vat {} matches total {}",
                format_amount(subtotal),
                format_amount(vat),
                format_amount(total)
            ),
        );
    }

    AuditCheck::fail(
        CheckType::Math,
        "total_amount",
        FailureSeverity::Critical,
        format!(
            "subtotal + vat = {} but total is {} (difference {})",
            format_amount(expected),
            format_amount(total),
            format_amount(difference)
        ),
    )
    .with_hint("re-inspect the total amount printed on the source document")
    .with_values(format_amount(expected), format_amount(total))
}

/// Sum of line totals must match the subtotal within `tolerance`.
pub fn verify_line_items(
    line_totals: &[Decimal],
    subtotal: Option<Decimal>,
    tolerance: Decimal,
) -> AuditCheck {
    if line_totals.is_empty() {
        return AuditCheck::pass(CheckType::LineItems, "subtotal", "no line items to verify");
    }
    let Some(subtotal) = subtotal else {
        return AuditCheck::pass(
            CheckType::LineItems,
            "subtotal",
            "line item sum skipped: no subtotal extracted",
        );
    };

    let Some((sum, difference)) = line_totals
        .iter()
        .try_fold(Decimal::ZERO, |sum, line_total| sum.checked_add(*line_total))
        .and_then(|sum| Some((sum, sum.checked_sub(subtotal)?.abs())))
    else {
        return AuditCheck::fail(
            CheckType::LineItems,
            "subtotal",
            FailureSeverity::Warning,
            "line item totals are out of the representable range",
        )
        .with_hint("check the line totals extracted from the source document");
    };
    if difference <= tolerance {
        return AuditCheck::pass(
            CheckType::LineItems,
            "subtotal",
            format!(
                "{} line items sum to subtotal {}",
                line_totals.len(),
                format_amount(subtotal)
            ),
        );
    }

    AuditCheck::fail(
        CheckType::LineItems,
        "subtotal",
        FailureSeverity::Warning,
        format!(
            "line items sum to {} but subtotal is {}",
            format_amount(sum),
            format_amount(subtotal)
        ),
    )
    .with_hint("some line items may be missing from the extraction")
    .with_values(format_amount(subtotal), format_amount(sum))
}

/// `quantity × unit_price` must match the line total of item `index`.
pub fn verify_line_item_math(index: usize, item: &LineItem, tolerance: Decimal) -> AuditCheck {
    let field = format!("lineItem[{index}]");
    let (quantity, unit_price, line_total) = match (item.quantity, item.unit_price, item.line_total)
    {
        (Some(quantity), Some(unit_price), Some(line_total)) => (quantity, unit_price, line_total),
        _ => {
            return AuditCheck::pass(
                CheckType::LineItemMath,
                field,
                "line calculation skipped: insufficient data",
            );
        }
    };

    let Some(expected) = quantity.checked_mul(unit_price) else {
        return AuditCheck::pass(
            CheckType::LineItemMath,
            field,
            "line calculation skipped: amount out of range",
        );
    };

    let Some(difference) = expected.checked_sub(line_total).map(|value| value.abs()) else {
        return AuditCheck::pass(
            CheckType::LineItemMath,
            field,
            "line calculation skipped: amount out of range",
        );
    };

    if difference <= tolerance {
        return AuditCheck::pass(
            CheckType::LineItemMath,
            field,
            format!("{quantity} x {} = {}", format_amount(unit_price), format_amount(line_total)),
        );
    }

    AuditCheck::fail(
        CheckType::LineItemMath,
        field,
        FailureSeverity::Warning,
        format!(
            "{quantity} x {} = {} but line total is {}",
            format_amount(unit_price),
            format_amount(expected),
            format_amount(line_total)
        ),
    )
    .with_hint("check the quantity, unit price and line total of this row")
    .with_values(format_amount(expected), format_amount(line_total))
}

/// A due date may not precede the issue date.
pub fn verify_dates(issue_date: Option<NaiveDate>, due_date: Option<NaiveDate>) -> AuditCheck {
    match (issue_date, due_date) {
        (Some(issued), Some(due)) if due < issued => AuditCheck::fail(
            CheckType::DateConsistency,
            "due_date",
            FailureSeverity::Warning,
            format!("due date {due} is before issue date {issued}"),
        )
        .with_hint("issue and due dates may have been swapped")
        .with_values(format!(">= {issued}"), due.to_string()),
        (Some(_), Some(_)) => {
            AuditCheck::pass(CheckType::DateConsistency, "due_date", "due date follows issue date")
        }
        _ => AuditCheck::pass(
            CheckType::DateConsistency,
            "due_date",
            "date check skipped: insufficient data",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::audit::Severity;
    use std::str::FromStr;

    fn amount(raw: &str) -> Decimal {
        Decimal::from_str(raw).expect("valid decimal")
    }

    fn tolerance() -> Decimal {
        amount("0.02")
    }

    #[test]
    fn totals_pass_when_exact() {
        let check = verify_totals(
            Some(amount("100.00")),
            Some(amount("21.00")),
            Some(amount("121.00")),
            tolerance(),
        );
        assert!(check.passed());
        assert_eq!(check.severity(), Severity::Info);
    }

    #[test]
    fn totals_pass_within_two_cents() {
        let check = verify_totals(
            Some(amount("100.00")),
            Some(amount("21.00")),
            Some(amount("121.02")),
            tolerance(),
        );
        assert!(check.passed());
    }

    #[test]
    fn totals_fail_critically_outside_tolerance() {
        let check = verify_totals(
            Some(amount("100.00")),
            Some(amount("21.00")),
            Some(amount("120.00")),
            tolerance(),
        );
        assert!(!check.passed());
        assert_eq!(check.severity(), Severity::Critical);
        assert_eq!(check.expected(), Some("121.00"));
        assert_eq!(check.actual(), Some("120.00"));
        assert!(check.hint().is_some());
    }

    #[test]
    fn totals_with_missing_amounts_are_skipped() {
        let none = verify_totals(None, None, None, tolerance());
        assert!(none.passed());
        assert_eq!(none.message(), "no amounts to verify");

        let partial = verify_totals(Some(amount("100")), None, Some(amount("121")), tolerance());
        assert!(partial.passed());
        assert!(partial.message().contains("insufficient data"));
    }

    #[test]
    fn line_items_matching_subtotal_pass() {
        let totals = [amount("50"), amount("30"), amount("20")];
        let check = verify_line_items(&totals, Some(amount("100")), tolerance());
        assert!(check.passed());
    }

    #[test]
    fn missing_line_items_fail_as_warning() {
        let totals = [amount("50"), amount("30")];
        let check = verify_line_items(&totals, Some(amount("100")), tolerance());
        assert!(!check.passed());
        assert_eq!(check.severity(), Severity::Warning);
        assert_eq!(check.actual(), Some("80.00"));
    }

    #[test]
    fn no_line_items_is_neutral() {
        let check = verify_line_items(&[], Some(amount("100")), tolerance());
        assert!(check.passed());
    }

    #[test]
    fn line_item_math_is_scoped_to_the_row() {
        let item = LineItem {
            description: Some("Widget".to_string()),
            quantity: Some(amount("3")),
            unit_price: Some(amount("10.00")),
            line_total: Some(amount("33.00")),
        };
        let check = verify_line_item_math(2, &item, tolerance());
        assert!(!check.passed());
        assert_eq!(check.severity(), Severity::Warning);
        assert_eq!(check.field(), "lineItem[2]");
        assert_eq!(check.expected(), Some("30.00"));
    }

    #[test]
    fn line_item_math_without_operands_passes() {
        let item = LineItem {
            line_total: Some(amount("12.00")),
            ..LineItem::default()
        };
        assert!(verify_line_item_math(0, &item, tolerance()).passed());
    }

    #[test]
    fn overflowing_amounts_fail_instead_of_panicking() {
        let huge = Decimal::MAX;

        let totals = verify_totals(Some(huge), Some(huge), Some(amount("1")), tolerance());
        assert!(!totals.passed());
        assert_eq!(totals.severity(), Severity::Critical);

        let sum = verify_line_items(&[huge, huge], Some(amount("100")), tolerance());
        assert!(!sum.passed());
        assert_eq!(sum.severity(), Severity::Warning);

        let row = LineItem {
            quantity: Some(amount("1")),
            unit_price: Some(huge),
            line_total: Some(Decimal::MIN),
            ..LineItem::default()
        };
        assert!(verify_line_item_math(0, &row, tolerance()).passed());
    }

    #[test]
    fn due_date_before_issue_date_warns() {
        let issued = NaiveDate::from_ymd_opt(2025, 3, 10);
        let due = NaiveDate::from_ymd_opt(2025, 3, 1);
        let check = verify_dates(issued, due);
        assert!(!check.passed());
        assert_eq!(check.severity(), Severity::Warning);
        assert!(verify_dates(due, issued).passed());
        assert!(verify_dates(None, issued).passed());
    }
}
