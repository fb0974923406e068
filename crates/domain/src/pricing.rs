//! The pricing calculator.
//!
//! Pure functions only: for a fixed input tuple the output is identical on
//! every call, which is what makes the monetary invariant mechanically
//! testable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::PromoCode;
use crate::money::Money;
use crate::order::OrderItem;

/// The monetary breakdown of an order.
///
/// Invariant: `total_amount` equals
/// `subtotal + tax_amount + service_fee + delivery_fee + tip_amount -
/// discount_amount`, clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub service_fee: Money,
    pub delivery_fee: Money,
    pub tip_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
}

/// Computes the full monetary breakdown for a set of line items.
///
/// The tax rate and service fee are restaurant configuration; the delivery
/// fee comes from zone matching (zero for non-delivery orders). An invalid
/// promo code contributes a zero discount and no error.
pub fn quote(
    items: &[OrderItem],
    tax_rate: f64,
    service_fee: Money,
    delivery_fee: Money,
    tip_amount: Money,
    promo: Option<&PromoCode>,
    now: DateTime<Utc>,
) -> Quote {
    let subtotal: Money = items.iter().map(OrderItem::line_total).sum();
    let tax_amount = subtotal.times_rate(tax_rate);
    let discount_amount = promo
        .map(|p| p.discount_for(subtotal, now))
        .unwrap_or_else(Money::zero);

    let total_amount = (subtotal + tax_amount + service_fee + delivery_fee + tip_amount
        - discount_amount)
        .clamp_non_negative();

    Quote {
        subtotal,
        tax_amount,
        service_fee,
        delivery_fee,
        tip_amount,
        discount_amount,
        total_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Discount;
    use chrono::Duration;
    use common::{MenuItemId, PromoCodeId};

    fn item(price_cents: i64, quantity: u32) -> OrderItem {
        OrderItem::new(
            MenuItemId::new(),
            "Test item",
            Money::from_cents(price_cents),
            quantity,
        )
    }

    fn active_promo(discount: Discount) -> PromoCode {
        let now = Utc::now();
        PromoCode {
            id: PromoCodeId::new(),
            code: "TEST".to_string(),
            discount,
            min_order_value: Money::zero(),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            usage_limit: None,
            usage_count: 0,
        }
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let items = vec![item(1000, 2), item(450, 3)];
        let q = quote(
            &items,
            0.0,
            Money::zero(),
            Money::zero(),
            Money::zero(),
            None,
            Utc::now(),
        );
        assert_eq!(q.subtotal.cents(), 3350);
        assert_eq!(q.total_amount.cents(), 3350);
    }

    #[test]
    fn customization_deltas_enter_subtotal() {
        let items = vec![
            item(1000, 2).with_customization("Extra cheese", Money::from_cents(150)),
        ];
        let q = quote(
            &items,
            0.0,
            Money::zero(),
            Money::zero(),
            Money::zero(),
            None,
            Utc::now(),
        );
        assert_eq!(q.subtotal.cents(), 2300);
    }

    #[test]
    fn dine_in_example() {
        // price=10, qty=2, taxRate=0.1, serviceFee=2, tip=3
        let items = vec![item(1000, 2)];
        let q = quote(
            &items,
            0.1,
            Money::from_cents(200),
            Money::zero(),
            Money::from_cents(300),
            None,
            Utc::now(),
        );
        assert_eq!(q.subtotal.cents(), 2000);
        assert_eq!(q.tax_amount.cents(), 200);
        assert_eq!(q.total_amount.cents(), 2700);
    }

    #[test]
    fn quote_is_deterministic() {
        let items = vec![item(999, 3), item(1250, 1)];
        let now = Utc::now();
        let promo = active_promo(Discount::Percentage {
            percent: 10,
            max_discount: None,
        });

        let a = quote(
            &items,
            0.0825,
            Money::from_cents(199),
            Money::from_cents(499),
            Money::from_cents(200),
            Some(&promo),
            now,
        );
        let b = quote(
            &items,
            0.0825,
            Money::from_cents(199),
            Money::from_cents(499),
            Money::from_cents(200),
            Some(&promo),
            now,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn total_matches_component_sum() {
        let items = vec![item(2199, 2), item(350, 4)];
        let promo = active_promo(Discount::Fixed {
            amount: Money::from_cents(500),
        });
        let q = quote(
            &items,
            0.0825,
            Money::from_cents(150),
            Money::from_cents(399),
            Money::from_cents(500),
            Some(&promo),
            Utc::now(),
        );

        let expected = q.subtotal + q.tax_amount + q.service_fee + q.delivery_fee + q.tip_amount
            - q.discount_amount;
        assert_eq!(q.total_amount, expected);
        assert!(!q.total_amount.is_negative());
    }

    #[test]
    fn percentage_discount_capped() {
        // discountValue=20, maxDiscount=10, subtotal=100 -> discount=10.
        let items = vec![item(10000, 1)];
        let promo = active_promo(Discount::Percentage {
            percent: 20,
            max_discount: Some(Money::from_cents(1000)),
        });
        let q = quote(
            &items,
            0.0,
            Money::zero(),
            Money::zero(),
            Money::zero(),
            Some(&promo),
            Utc::now(),
        );
        assert_eq!(q.discount_amount.cents(), 1000);
    }

    #[test]
    fn expired_promo_is_silent_zero() {
        let items = vec![item(5000, 1)];
        let mut promo = active_promo(Discount::Fixed {
            amount: Money::from_cents(1000),
        });
        promo.valid_until = Utc::now() - Duration::hours(1);

        let q = quote(
            &items,
            0.1,
            Money::zero(),
            Money::zero(),
            Money::zero(),
            Some(&promo),
            Utc::now(),
        );
        assert_eq!(q.discount_amount, Money::zero());
        assert_eq!(q.total_amount.cents(), 5500);
    }

    #[test]
    fn total_clamped_at_zero() {
        let items = vec![item(100, 1)];
        let promo = active_promo(Discount::Fixed {
            amount: Money::from_cents(10_000),
        });
        // Fixed discount caps at subtotal, so only tax/fees keep the total
        // positive; with everything else zero the clamp keeps it at zero.
        let q = quote(
            &items,
            0.0,
            Money::zero(),
            Money::zero(),
            Money::zero(),
            Some(&promo),
            Utc::now(),
        );
        assert_eq!(q.discount_amount.cents(), 100);
        assert_eq!(q.total_amount, Money::zero());
    }

    #[test]
    fn empty_items_quote_to_fees_only() {
        let q = quote(
            &[],
            0.1,
            Money::from_cents(200),
            Money::zero(),
            Money::from_cents(100),
            None,
            Utc::now(),
        );
        assert_eq!(q.subtotal, Money::zero());
        assert_eq!(q.tax_amount, Money::zero());
        assert_eq!(q.total_amount.cents(), 300);
    }
}
