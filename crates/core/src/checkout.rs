//! Checkout: order summary math and form validation.
//!
//! There is no payment processing. A valid form is accepted as-is; the
//! storefront clears the cart and shows a confirmation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::Price;

/// Flat shipping charge per order, in cents.
pub const SHIPPING_CENTS: u32 = 1500;

/// Sales tax rate applied to the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Money totals for a non-empty cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
    pub item_count: u64,
}

impl OrderSummary {
    /// Compute the summary for `cart`, or `None` if it is empty.
    ///
    /// ```
    /// use coza_core::{Cart, CartItem, Price, ProductId};
    /// use coza_core::checkout::OrderSummary;
    ///
    /// let mut cart = Cart::default();
    /// cart.add_item(CartItem {
    ///     id: ProductId::parse("p1").unwrap(),
    ///     name: "Bag".to_owned(),
    ///     price: Price::parse("100").unwrap(),
    ///     image: String::new(),
    /// }, 1);
    ///
    /// let summary = OrderSummary::for_cart(&cart).unwrap();
    /// assert_eq!(summary.tax.to_string(), "$8.00");
    /// assert_eq!(summary.total.to_string(), "$123.00");
    /// assert!(OrderSummary::for_cart(&Cart::default()).is_none());
    /// ```
    #[must_use]
    pub fn for_cart(cart: &Cart) -> Option<Self> {
        if cart.is_empty() {
            return None;
        }

        let subtotal = cart.subtotal();
        let shipping = Price::from_cents(SHIPPING_CENTS);
        let tax = subtotal.scaled(TAX_RATE);

        Some(Self {
            subtotal,
            shipping,
            tax,
            total: (subtotal + shipping + tax).rounded(),
            item_count: cart.total_items(),
        })
    }
}

/// Payment method chosen on the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
    Cod,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::Card, Self::Paypal, Self::Cod];

    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Paypal => "paypal",
            Self::Cod => "cod",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Card => "Credit Card",
            Self::Paypal => "PayPal",
            Self::Cod => "Cash on Delivery",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(s.trim()))
            .ok_or(CheckoutError::InvalidPaymentMethod)
    }
}

/// States the store ships to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingState {
    Ny,
    Ca,
    Tx,
}

impl ShippingState {
    pub const ALL: [Self; 3] = [Self::Ny, Self::Ca, Self::Tx];

    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Ny => "ny",
            Self::Ca => "ca",
            Self::Tx => "tx",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ny => "New York",
            Self::Ca => "California",
            Self::Tx => "Texas",
        }
    }
}

impl std::str::FromStr for ShippingState {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.key().eq_ignore_ascii_case(s.trim()))
            .ok_or(CheckoutError::InvalidState)
    }
}

/// A single checkout field error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("please select a state")]
    InvalidState,
    #[error("please choose a payment method")]
    InvalidPaymentMethod,
    #[error("ZIP code must be 5 digits")]
    InvalidZip,
    #[error("phone number must contain at least 7 digits")]
    InvalidPhone,
    #[error("card number must be 12 to 19 digits")]
    InvalidCardNumber,
    #[error("expiry date must be in MM/YY format")]
    InvalidExpiry,
    #[error("CVC must be 3 or 4 digits")]
    InvalidCvc,
}

/// Raw checkout form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub payment_method: String,
    pub card_name: String,
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

/// Card details, kept only long enough to show the last four digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub name: String,
    pub last4: String,
    pub expiry: String,
}

/// A validated checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: ShippingState,
    pub zip: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub card: Option<CardDetails>,
}

impl Checkout {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

fn required(value: &str, field: &'static str, errors: &mut Vec<CheckoutError>) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(CheckoutError::Required(field));
    }
    value.to_owned()
}

fn valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let (month, year) = (month.trim(), year.trim());
    month.len() == 2
        && year.len() == 2
        && year.chars().all(|c| c.is_ascii_digit())
        && month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m))
}

impl CheckoutForm {
    /// Validate every field, collecting all errors rather than stopping at the
    /// first.
    ///
    /// Card fields are only checked when the payment method is `card`.
    ///
    /// # Errors
    ///
    /// Returns the list of field errors if any field is invalid.
    pub fn validate(&self) -> Result<Checkout, Vec<CheckoutError>> {
        let mut errors = Vec::new();

        let first_name = required(&self.first_name, "First name", &mut errors);
        let last_name = required(&self.last_name, "Last name", &mut errors);
        let address = required(&self.address, "Address", &mut errors);
        let city = required(&self.city, "City", &mut errors);

        let state = self
            .state
            .parse::<ShippingState>()
            .map_err(|e| errors.push(e))
            .ok();

        let zip = self.zip.trim().to_owned();
        if zip.len() != 5 || !zip.chars().all(|c| c.is_ascii_digit()) {
            errors.push(CheckoutError::InvalidZip);
        }

        let phone = self.phone.trim().to_owned();
        if digits(&phone).len() < 7 {
            errors.push(CheckoutError::InvalidPhone);
        }

        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| errors.push(e))
            .ok();

        let card = if payment_method == Some(PaymentMethod::Card) {
            let name = required(&self.card_name, "Name on card", &mut errors);

            let number = digits(&self.card_number);
            if !(12..=19).contains(&number.len()) {
                errors.push(CheckoutError::InvalidCardNumber);
            }

            let expiry = self.expiry.trim().to_owned();
            if !valid_expiry(&expiry) {
                errors.push(CheckoutError::InvalidExpiry);
            }

            let cvc = self.cvc.trim();
            if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
                errors.push(CheckoutError::InvalidCvc);
            }

            let last4 = number
                .get(number.len().saturating_sub(4)..)
                .unwrap_or_default()
                .to_owned();
            Some(CardDetails {
                name,
                last4,
                expiry,
            })
        } else {
            None
        };

        match (state, payment_method) {
            (Some(state), Some(payment_method)) if errors.is_empty() => Ok(Checkout {
                first_name,
                last_name,
                address,
                city,
                state,
                zip,
                phone,
                payment_method,
                card,
            }),
            _ => Err(errors),
        }
    }
}
