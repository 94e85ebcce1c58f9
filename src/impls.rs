use crate::types::*;
use crate::defines::*;
use crate::util::decimal_string;

/// Provide the hard-coded test order as default values for `OrderRequest`
impl Default for OrderRequest {
    fn default() -> OrderRequest {
        OrderRequest {
            quantity: TEST_ORDER_UNITS,
            instrument: TEST_ORDER_INSTRUMENT.to_string(),
            price: TEST_ORDER_PRICE,
            take_profit: TEST_ORDER_TAKE_PROFIT,
            stop_loss: TEST_ORDER_STOP_LOSS,
        }
    }
}

impl OrderRequest {
    /// Wire representation of this order, GTC limit order with stop-loss and take-profit on fill.
    pub fn to_envelope(&self) -> OrderEnvelope {
        OrderEnvelope {
            order: LimitOrderBody {
                units: self.quantity.to_string(),
                instrument: self.instrument.clone(),
                price: decimal_string(self.price),
                order_type: "LIMIT",
                time_in_force: "GTC",
                position_fill: "DEFAULT",
                stop_loss_on_fill: StopLossDetails {
                    time_in_force: "GTC",
                    price: decimal_string(self.stop_loss),
                },
                take_profit_on_fill: TakeProfitDetails {
                    price: decimal_string(self.take_profit),
                },
            }
        }
    }
}

impl SettingsError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SettingsError::ConfigMissing(_) | SettingsError::OutputDirectory { .. } => EXIT_CODE_PATH,
            SettingsError::ConfigUnreadable { .. }
            | SettingsError::ConfigParse { .. }
            | SettingsError::ConfigNotObject(_) => EXIT_CODE_CONFIG_PARSE,
            SettingsError::UnexpectedKeys { .. } => EXIT_CODE_CONFIG_KEYS,
        }
    }
}
