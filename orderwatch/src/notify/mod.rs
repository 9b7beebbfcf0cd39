//! Notification assembly and dispatch
//!
//! Builds one consolidated transmission for all of a customer's delivered,
//! unnotified orders. Body markup beyond the list sections is delegated to
//! a `BodyRenderer`; the shipped `PlainBody` keeps it minimal.

use anyhow::{Result, ensure};
use chrono::Local;
use log::{error, info};

use crate::api::{Address, Content, MailSender, Recipient, Transmission};
use crate::config::NotifyConfig;
use crate::order::OrderRecord;

/// Everything a body renderer needs for one notification
#[derive(Debug, Clone)]
pub struct NoticeContext {
    pub customer_name: String,
    /// PO values, one per line
    pub order_numbers: String,
    /// `product (qty)` pairs, one per line
    pub product_list: String,
    /// Tracking numbers, one per line, each prefixed with "-"
    pub tracking_list: String,
    /// The customer's real address, kept visible for traceability when the
    /// transmission is redirected
    pub original_email: String,
    pub sent_to: String,
    pub testing: bool,
    pub timestamp: String,
}

/// Seam for the notification body; rich branded templating lives outside
/// this crate
pub trait BodyRenderer: Send + Sync {
    fn text(&self, ctx: &NoticeContext) -> String;
    fn html(&self, ctx: &NoticeContext) -> String;
}

/// Minimal renderer shipping with the crate
pub struct PlainBody;

impl BodyRenderer for PlainBody {
    fn text(&self, ctx: &NoticeContext) -> String {
        let banner = if ctx.testing {
            format!(
                "TESTING MODE\nOriginal client email: {}\nThis email was sent to: {}\nTimestamp: {}\n-------------------\n",
                ctx.original_email, ctx.sent_to, ctx.timestamp
            )
        } else {
            String::new()
        };
        format!(
            "{}Hi {},\n\n\
             Your order has been delivered, and we'd like to know if everything met your expectations.\n\n\
             Order Number's:\n{}\n\n\
             Products:\n{}\n\n\
             Tracking Information:\n{}\n\n\
             If anything needs attention or you have a question, just reply - we'll take care of it.\n\n\
             Thanks again for your order. We're looking forward to the next one.\n",
            banner,
            ctx.customer_name,
            if ctx.order_numbers.is_empty() { "N/A" } else { &ctx.order_numbers },
            if ctx.product_list.is_empty() { "No products specified" } else { &ctx.product_list },
            ctx.tracking_list,
        )
    }

    fn html(&self, ctx: &NoticeContext) -> String {
        format!(
            "<html><body><p>{}</p></body></html>",
            self.text(ctx).replace('\n', "<br>")
        )
    }
}

/// PO values joined by newline; empty POs dropped
pub fn order_numbers(orders: &[OrderRecord]) -> String {
    orders
        .iter()
        .map(|o| o.po.as_str())
        .filter(|po| !po.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-order `product (qty)` lines
///
/// Multi-product orders expand each product/qty pair on its own line; qty
/// is omitted when absent. Product and qty lists may differ in length, so
/// the zip is defensive.
pub fn product_list(orders: &[OrderRecord]) -> String {
    orders
        .iter()
        .map(|order| {
            let products: Vec<&str> = order
                .products
                .split('\n')
                .filter(|p| !p.trim().is_empty())
                .collect();
            let qtys: Vec<&str> = order
                .qty
                .split('\n')
                .filter(|q| !q.trim().is_empty())
                .collect();

            if products.len() > 1 {
                products
                    .iter()
                    .enumerate()
                    .map(|(i, product)| match qtys.get(i) {
                        Some(qty) => format!("{} ({})", product, qty),
                        None => product.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            } else if !order.products.is_empty() && !order.qty.is_empty() {
                format!("{} ({})", order.products, order.qty)
            } else {
                order.products.clone()
            }
        })
        .filter(|entry| !entry.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tracking numbers, one per line, "-" prefixed; placeholder when none
pub fn tracking_list(orders: &[OrderRecord]) -> String {
    let lines: Vec<String> = orders
        .iter()
        .flat_map(|o| o.tracking_number.split('\n'))
        .filter(|t| !t.trim().is_empty())
        .map(|t| format!("-{}", t))
        .collect();
    if lines.is_empty() {
        "No tracking numbers available".to_string()
    } else {
        lines.join("\n")
    }
}

/// Assemble the transmission for a non-empty batch of same-customer orders
pub fn build_transmission(
    config: &NotifyConfig,
    renderer: &dyn BodyRenderer,
    email: &str,
    orders: &[OrderRecord],
) -> Result<Transmission> {
    ensure!(!orders.is_empty(), "Notification batch is empty");

    let customer_name = orders
        .first()
        .map(|o| o.customer_name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Valued Customer".to_string());

    let testing = config.testing.as_ref();
    let destination = testing
        .map(|t| t.destination.clone())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| email.to_string());
    let recipient_name = if testing.is_some() {
        "Tester".to_string()
    } else {
        customer_name.clone()
    };
    let subject_prefix = testing.map(|t| t.subject_prefix.as_str()).unwrap_or("");

    let ctx = NoticeContext {
        customer_name,
        order_numbers: order_numbers(orders),
        product_list: product_list(orders),
        tracking_list: tracking_list(orders),
        original_email: email.to_string(),
        sent_to: destination.clone(),
        testing: testing.is_some(),
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    Ok(Transmission {
        use_sandbox: false,
        recipients: vec![Recipient {
            address: Address {
                email: destination,
                name: recipient_name,
            },
        }],
        content: Content {
            from: Address {
                email: config.from_email.clone(),
                name: config.from_name.clone(),
            },
            subject: format!("{}Your order has been delivered", subject_prefix),
            html: renderer.html(&ctx),
            text: renderer.text(&ctx),
        },
    })
}

/// Send one consolidated notification; `Ok(true)` only when the endpoint
/// accepted at least one recipient
///
/// Callers must mark rows as sent only on `Ok(true)`; marking before a
/// confirmed send would lose the notification with no retry path.
pub async fn send_delivery_email(
    sender: &dyn MailSender,
    renderer: &dyn BodyRenderer,
    config: &NotifyConfig,
    email: &str,
    orders: &[OrderRecord],
) -> Result<bool> {
    let transmission = build_transmission(config, renderer, email, orders)?;
    let recipient = &transmission.recipients[0].address.email;
    info!(
        "Sending delivery notification to {} covering {} order(s)",
        recipient,
        orders.len()
    );

    match sender.send(&transmission).await {
        Ok(outcome) if outcome.delivered() => {
            if config.is_testing() {
                info!("Test notification sent to {} (original recipient {})", recipient, email);
            } else {
                info!("Notification sent to {}", email);
            }
            Ok(true)
        }
        Ok(_) => {
            error!("Transmission endpoint accepted no recipients for {}", email);
            Ok(false)
        }
        Err(err) => {
            error!("Failed to send notification to {}: {:#}", email, err);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestingConfig;

    fn order(po: &str, products: &str, qty: &str, tracking: &str) -> OrderRecord {
        OrderRecord {
            po: po.to_string(),
            products: products.to_string(),
            qty: qty.to_string(),
            tracking_number: tracking.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_order_numbers_drop_empty_pos() {
        let orders = vec![order("PO-1", "", "", ""), order("", "", "", ""), order("PO-3", "", "", "")];
        assert_eq!(order_numbers(&orders), "PO-1\nPO-3");
    }

    #[test]
    fn test_product_list_single_and_multi() {
        let orders = vec![
            order("", "Cable A", "5", ""),
            order("", "Cable B\nCable C", "2\n7", ""),
        ];
        assert_eq!(product_list(&orders), "Cable A (5)\nCable B (2)\nCable C (7)");
    }

    #[test]
    fn test_product_list_zips_defensively() {
        // more products than quantities
        let orders = vec![order("", "Cable A\nCable B", "5", "")];
        assert_eq!(product_list(&orders), "Cable A (5)\nCable B");

        // qty without product contributes nothing
        let orders = vec![order("", "", "5", "")];
        assert_eq!(product_list(&orders), "");
    }

    #[test]
    fn test_tracking_list_prefix_and_placeholder() {
        let orders = vec![order("", "", "", "1Z01\n1Z02"), order("", "", "", "1Z03")];
        assert_eq!(tracking_list(&orders), "-1Z01\n-1Z02\n-1Z03");

        let none = vec![order("", "", "", "")];
        assert_eq!(tracking_list(&none), "No tracking numbers available");
    }

    #[test]
    fn test_build_transmission_production() {
        let config = NotifyConfig::default();
        let mut first = order("PO-1", "Cable A", "5", "1Z01");
        first.customer_name = "Ada".to_string();

        let t = build_transmission(&config, &PlainBody, "a@x.com", &[first]).unwrap();
        assert_eq!(t.recipients[0].address.email, "a@x.com");
        assert_eq!(t.recipients[0].address.name, "Ada");
        assert_eq!(t.content.subject, "Your order has been delivered");
        assert!(t.content.text.contains("Hi Ada,"));
        assert!(!t.content.text.contains("TESTING MODE"));
        assert!(t.content.html.contains("Cable A (5)"));
    }

    #[test]
    fn test_build_transmission_testing_override() {
        let mut config = NotifyConfig::default();
        config.testing = Some(TestingConfig {
            destination: "qa@example.com".to_string(),
            ..Default::default()
        });

        let t = build_transmission(&config, &PlainBody, "a@x.com", &[order("PO-1", "", "", "")])
            .unwrap();
        assert_eq!(t.recipients[0].address.email, "qa@example.com");
        assert_eq!(t.recipients[0].address.name, "Tester");
        assert_eq!(t.content.subject, "[TESTING] Your order has been delivered");
        // the true recipient stays visible in the body
        assert!(t.content.text.contains("a@x.com"));
        assert!(t.content.text.contains("TESTING MODE"));
    }

    #[test]
    fn test_missing_customer_name_falls_back() {
        let config = NotifyConfig::default();
        let t = build_transmission(&config, &PlainBody, "a@x.com", &[order("PO-1", "", "", "")])
            .unwrap();
        assert_eq!(t.recipients[0].address.name, "Valued Customer");
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let config = NotifyConfig::default();
        assert!(build_transmission(&config, &PlainBody, "a@x.com", &[]).is_err());
    }
}
