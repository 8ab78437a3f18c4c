//! Checkout route handlers.
//!
//! There is no payment processing and orders are not stored. A valid form
//! empties the cart and the accepted order is kept in the session only long
//! enough to show the confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use coza_core::Cart;
use coza_core::checkout::{Checkout, CheckoutForm, OrderSummary, PaymentMethod, ShippingState};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::PageContext;
use crate::models::keys;
use crate::routes::shop::FilterOption;
use crate::services::CartStore;

/// An accepted order, as shown on the confirmation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedOrder {
    pub reference: Uuid,
    pub placed_at: DateTime<Utc>,
    pub name: String,
    pub ship_to: String,
    pub payment: String,
    pub summary: OrderSummary,
}

impl ConfirmedOrder {
    fn new(checkout: &Checkout, summary: OrderSummary) -> Self {
        let payment = checkout.card.as_ref().map_or_else(
            || checkout.payment_method.label().to_owned(),
            |card| format!("Card ending in {}", card.last4),
        );

        Self {
            reference: Uuid::new_v4(),
            placed_at: Utc::now(),
            name: checkout.full_name(),
            ship_to: format!(
                "{}, {}, {} {}",
                checkout.address,
                checkout.city,
                checkout.state.label(),
                checkout.zip
            ),
            payment,
            summary,
        }
    }

    /// Short reference printed on the page.
    #[must_use]
    pub fn short_reference(&self) -> String {
        self.reference
            .simple()
            .to_string()
            .chars()
            .take(8)
            .collect::<String>()
            .to_uppercase()
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: Cart,
    pub summary: OrderSummary,
    pub form: CheckoutForm,
    pub states: Vec<FilterOption>,
    pub payment_methods: Vec<FilterOption>,
    pub errors: Vec<String>,
}

impl CheckoutTemplate {
    fn new(
        page: PageContext,
        cart: Cart,
        summary: OrderSummary,
        form: CheckoutForm,
        errors: Vec<String>,
    ) -> Self {
        let states = ShippingState::ALL
            .iter()
            .map(|st| FilterOption {
                value: st.key().to_owned(),
                label: st.label().to_owned(),
                selected: st.key().eq_ignore_ascii_case(form.state.trim()),
            })
            .collect();

        let chosen = form
            .payment_method
            .parse::<PaymentMethod>()
            .unwrap_or_default();
        let payment_methods = PaymentMethod::ALL
            .iter()
            .map(|method| FilterOption {
                value: method.key().to_owned(),
                label: method.label().to_owned(),
                selected: *method == chosen,
            })
            .collect();

        Self {
            page,
            cart,
            summary,
            form,
            states,
            payment_methods,
            errors,
        }
    }
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub page: PageContext,
    pub order: ConfirmedOrder,
}

/// Split a display name into a first/last name prefill.
fn name_prefill(page: &PageContext) -> CheckoutForm {
    let mut form = CheckoutForm::default();
    if let Some(user) = &page.user {
        let mut parts = user.display_name.splitn(2, ' ');
        form.first_name = parts.next().unwrap_or_default().to_owned();
        form.last_name = parts.next().unwrap_or_default().trim().to_owned();
    }
    form
}

/// Display the checkout form. An empty cart goes back to the cart page.
#[instrument(skip(session, page))]
pub async fn show(session: Session, page: PageContext) -> Result<Response> {
    let cart = CartStore::new(&session).cart().await?;
    let Some(summary) = OrderSummary::for_cart(&cart) else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let form = name_prefill(&page);
    Ok(CheckoutTemplate::new(page, cart, summary, form, Vec::new()).into_response())
}

/// Validate and accept the order.
#[instrument(skip_all)]
pub async fn place_order(
    session: Session,
    page: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let store = CartStore::new(&session);
    let cart = store.cart().await?;
    let Some(summary) = OrderSummary::for_cart(&cart) else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let checkout = match form.validate() {
        Ok(checkout) => checkout,
        Err(errors) => {
            let messages = errors.iter().map(ToString::to_string).collect();
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutTemplate::new(page, cart, summary, form, messages),
            )
                .into_response());
        }
    };

    let order = ConfirmedOrder::new(&checkout, summary);
    session.insert(keys::LAST_ORDER, &order).await?;
    store.save_cart(&Cart::default()).await?;

    add_breadcrumb("checkout", "Order placed", None);
    tracing::info!(
        order_ref = %order.reference,
        items = summary.item_count,
        total = %summary.total,
        "order accepted"
    );

    Ok(Redirect::to("/checkout/confirmation").into_response())
}

/// Show the last accepted order.
#[instrument(skip_all)]
pub async fn confirmation(session: Session, page: PageContext) -> Result<Response> {
    let order: Option<ConfirmedOrder> = session.get(keys::LAST_ORDER).await.ok().flatten();

    Ok(match order {
        Some(order) => ConfirmationTemplate { page, order }.into_response(),
        None => Redirect::to("/").into_response(),
    })
}
