use crate::errors::NeatError;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

const LEAKY_RELU_ALPHA: f64 = 0.01;
const PRELU_ALPHA: f64 = 0.1;
const ELU_ALPHA: f64 = 1.0;
const SWISH_BETA: f64 = 1.0;

/// The activation function a node applies
/// to its accumulated input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    // 1 if x > 0, else 0
    Step,
    // 1 / (1 + exp(-x))
    Sigmoid,
    Tanh,
    // max(0, x)
    Relu,
    // x if x > 0, else 0.01x
    LeakyRelu,
    // x if x > 0, else 0.1x
    Prelu,
    // x if x > 0, else exp(x) - 1
    Elu,
    // exp(x) / (1 + exp(x))
    Softmax,
    // x
    Linear,
    // x * sigmoid(x)
    Swish,
}

impl Activation {
    /// Every available activation, in declaration order.
    pub const ALL: [Activation; 10] = [
        Activation::Step,
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Relu,
        Activation::LeakyRelu,
        Activation::Prelu,
        Activation::Elu,
        Activation::Softmax,
        Activation::Linear,
        Activation::Swish,
    ];

    /// Applies the activation function to `x`.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::Activation;
    ///
    /// assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(Activation::Relu.apply(-3.0), 0.0);
    /// assert_eq!(Activation::Linear.apply(-3.0), -3.0);
    /// ```
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid | Activation::Softmax => logistic(x),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => leaky(x, LEAKY_RELU_ALPHA),
            Activation::Prelu => leaky(x, PRELU_ALPHA),
            Activation::Elu => {
                if x > 0.0 {
                    x
                } else {
                    ELU_ALPHA * x.exp_m1()
                }
            }
            Activation::Linear => x,
            Activation::Swish => x * logistic(SWISH_BETA * x),
        }
    }

    /// The configuration name of the activation.
    pub fn name(self) -> &'static str {
        match self {
            Activation::Step => "step",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Prelu => "prelu",
            Activation::Elu => "elu",
            Activation::Softmax => "softmax",
            Activation::Linear => "linear",
            Activation::Swish => "swish",
        }
    }
}

/// Logistic function, split on the sign of `x`
/// so that `exp` never overflows.
fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn leaky(x: f64, alpha: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        alpha * x
    }
}

impl FromStr for Activation {
    type Err = NeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| NeatError::InvalidConfig(format!("unknown activation {:?}", s)))
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_at_zero() {
        assert_eq!(Activation::Step.apply(0.0), 0.0);
        assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert_eq!(Activation::Softmax.apply(0.0), 0.5);
        assert_eq!(Activation::Tanh.apply(0.0), 0.0);
        assert_eq!(Activation::Elu.apply(0.0), 0.0);
        assert_eq!(Activation::Swish.apply(0.0), 0.0);
    }

    #[test]
    fn negative_slopes() {
        assert!((Activation::LeakyRelu.apply(-2.0) + 0.02).abs() < 1e-12);
        assert!((Activation::Prelu.apply(-2.0) + 0.2).abs() < 1e-12);
        assert!((Activation::Elu.apply(-1.0) - ((-1.0f64).exp() - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn extreme_inputs_stay_finite() {
        for activation in Activation::ALL {
            for x in [-1e6, -800.0, 800.0, 1e6] {
                let y = activation.apply(x);
                assert!(!y.is_nan(), "{} produced NaN at {}", activation, x);
            }
        }
        assert_eq!(Activation::Softmax.apply(1e6), 1.0);
        assert_eq!(Activation::Sigmoid.apply(-1e6), 0.0);
    }

    #[test]
    fn names_round_trip() {
        for activation in Activation::ALL {
            assert_eq!(activation.name().parse::<Activation>().unwrap(), activation);
            let json = serde_json::to_string(&activation).unwrap();
            assert_eq!(json, format!("\"{}\"", activation.name()));
        }
        assert!("gaussian".parse::<Activation>().is_err());
    }
}
