//! Gateway adapter contract and method routing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::errors::ServiceError;
use crate::models::payment::{
    GatewayKind, PaymentIntent, PaymentMethod, PaymentMethodInfo, PaymentRequest,
};

/// Uniform interface over one payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn kind(&self) -> GatewayKind;

    /// Methods this provider declares ownership of. The tables of the
    /// registered adapters are disjoint; routing never guesses.
    fn supported_methods(&self) -> &[PaymentMethod];

    /// Whether the required credentials are present. Unconfigured adapters
    /// are excluded from routing and from the public method listing.
    fn is_configured(&self) -> bool;

    /// Issues a provider-side payment object for an amount already
    /// expressed in the provider's smallest currency unit.
    async fn create_payment(&self, request: &PaymentRequest)
        -> Result<PaymentIntent, ServiceError>;

    /// Refreshes settlement status, translating the provider's own status
    /// vocabulary into the three-state model.
    async fn confirm_payment(&self, payment_id: &str) -> Result<PaymentIntent, ServiceError>;

    fn supports(&self, method: PaymentMethod) -> bool {
        self.supported_methods().contains(&method)
    }
}

/// Resolves payment methods to adapters. Adapters are registered once at
/// startup; `default_gateway` (the card/wallet processor) is the only
/// permitted last-resort fallback, and only for methods it declares itself.
/// A regional bank-transfer method never silently lands on a global card
/// processor that has no knowledge of it.
pub struct GatewayRouter {
    gateways: Vec<Arc<dyn PaymentGateway>>,
    default_gateway: GatewayKind,
}

impl GatewayRouter {
    pub fn new(default_gateway: GatewayKind) -> Self {
        Self {
            gateways: Vec::new(),
            default_gateway,
        }
    }

    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        info!(
            gateway = %gateway.kind(),
            configured = gateway.is_configured(),
            "registered payment gateway"
        );
        self.gateways.push(gateway);
    }

    /// Typed lookup used on the confirmation path, where the client names
    /// the gateway that issued the intent.
    pub fn get(&self, kind: GatewayKind) -> Result<Arc<dyn PaymentGateway>, ServiceError> {
        self.gateways
            .iter()
            .find(|g| g.kind() == kind)
            .cloned()
            .ok_or_else(|| ServiceError::BadRequest(format!("gateway {kind} is not registered")))
    }

    pub fn select_for_method(
        &self,
        method: PaymentMethod,
    ) -> Result<Arc<dyn PaymentGateway>, ServiceError> {
        let owner = self.gateways.iter().find(|g| g.supports(method));

        match owner {
            Some(gateway) if gateway.is_configured() => Ok(gateway.clone()),
            Some(gateway) => {
                if gateway.kind() != self.default_gateway {
                    if let Ok(default) = self.get(self.default_gateway) {
                        if default.supports(method) && default.is_configured() {
                            return Ok(default);
                        }
                    }
                }
                Err(ServiceError::NoConfiguredGateway(method))
            }
            None => Err(ServiceError::NoConfiguredGateway(method)),
        }
    }

    /// Methods currently servable, tagged with their owning gateway and
    /// display category.
    pub fn available_methods(&self) -> Vec<PaymentMethodInfo> {
        self.gateways
            .iter()
            .filter(|g| g.is_configured())
            .flat_map(|gateway| {
                let kind = gateway.kind();
                gateway.supported_methods().iter().map(move |&method| {
                    PaymentMethodInfo {
                        method,
                        gateway: kind,
                        name: method.display_name().to_string(),
                        category: method.category(),
                    }
                })
            })
            .collect()
    }
}
