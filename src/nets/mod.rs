//! Policy network variants
//!
//! A closed set of function approximators over ℝ^d → ℝ^d, selected by a
//! [`NetworkKind`] tag. All variants regress velocities from positions; the
//! certified variant additionally exposes a scalar potential whose level
//! sets the field descends.

mod affine;
mod flow;
mod linear;
mod mlp;
mod stable;

pub use affine::AffineNet;
pub use flow::FlowNet;
pub use linear::Linear;
pub use mlp::MlpNet;
pub use stable::StableNet;

use crate::autograd::Tensor;
use crate::{Error, Result};
use ndarray::Array1;
use rand::rngs::StdRng;
use std::fmt;
use std::str::FromStr;

/// Hidden width shared by the nonlinear variants.
pub(crate) const HIDDEN_DIM: usize = 64;

/// The closed set of supported network kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkKind {
    /// Free-form tanh MLP regressor, no stability guarantee.
    Mlp,
    /// Affine-output baseline `v = Wx + b`, no stability guarantee.
    Affine,
    /// Jointly learned field and potential, convergent by construction.
    Stable,
    /// Residual-diffeomorphism field anchored at the goal.
    Flow,
}

impl NetworkKind {
    /// Canonical tag, also the storage subdirectory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Mlp => "mlp",
            NetworkKind::Affine => "affine",
            NetworkKind::Stable => "stable",
            NetworkKind::Flow => "flow",
        }
    }

    /// Whether this kind carries a potential function.
    pub fn has_potential(&self) -> bool {
        matches!(self, NetworkKind::Stable)
    }
}

impl FromStr for NetworkKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "mlp" => Ok(NetworkKind::Mlp),
            "affine" => Ok(NetworkKind::Affine),
            "stable" => Ok(NetworkKind::Stable),
            "flow" => Ok(NetworkKind::Flow),
            other => Err(Error::UnsupportedNetworkType(other.to_string())),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A policy network of some [`NetworkKind`].
pub enum PolicyNet {
    Mlp(MlpNet),
    Affine(AffineNet),
    Stable(StableNet),
    Flow(FlowNet),
}

impl PolicyNet {
    /// Instantiate a freshly initialized network of the given kind.
    ///
    /// This is also the re-initialization path used on divergence recovery.
    pub fn init(kind: NetworkKind, dim: usize, goal: &Array1<f32>, rng: &mut StdRng) -> Self {
        match kind {
            NetworkKind::Mlp => PolicyNet::Mlp(MlpNet::new(dim, HIDDEN_DIM, rng)),
            NetworkKind::Affine => PolicyNet::Affine(AffineNet::new(dim, rng)),
            NetworkKind::Stable => {
                PolicyNet::Stable(StableNet::new(dim, HIDDEN_DIM, goal.clone(), rng))
            }
            NetworkKind::Flow => PolicyNet::Flow(FlowNet::new(dim, HIDDEN_DIM, goal.clone(), rng)),
        }
    }

    /// The kind tag of this network.
    pub fn kind(&self) -> NetworkKind {
        match self {
            PolicyNet::Mlp(_) => NetworkKind::Mlp,
            PolicyNet::Affine(_) => NetworkKind::Affine,
            PolicyNet::Stable(_) => NetworkKind::Stable,
            PolicyNet::Flow(_) => NetworkKind::Flow,
        }
    }

    /// Build the velocity field's tape expression at a single position.
    pub fn forward(&self, x: &Array1<f32>) -> Tensor {
        let leaf = Tensor::new(x.clone(), false);
        match self {
            PolicyNet::Mlp(net) => net.forward(&leaf),
            PolicyNet::Affine(net) => net.forward(&leaf),
            PolicyNet::Stable(net) => net.forward(&leaf),
            PolicyNet::Flow(net) => net.forward(&leaf),
        }
    }

    /// Evaluate the field at a single position.
    pub fn predict(&self, x: &Array1<f32>) -> Array1<f32> {
        self.forward(x).data()
    }

    /// Evaluate the potential at a single position, for variants that have one.
    pub fn potential(&self, x: &Array1<f32>) -> Option<f32> {
        match self {
            PolicyNet::Stable(net) => Some(net.potential(x)),
            _ => None,
        }
    }

    /// Shared handles to every trainable parameter.
    pub fn params(&self) -> Vec<Tensor> {
        self.named_params().into_iter().map(|(_, t)| t).collect()
    }

    /// Named handles to every trainable parameter.
    pub fn named_params(&self) -> Vec<(String, Tensor)> {
        match self {
            PolicyNet::Mlp(net) => net.named_params("fhat"),
            PolicyNet::Affine(net) => net.named_params(),
            PolicyNet::Stable(net) => net.named_params(),
            PolicyNet::Flow(net) => net.named_params(),
        }
    }

    /// Overwrite parameters from persisted `(name, values)` pairs.
    ///
    /// Every stored entry must match an existing parameter by name and
    /// length; anything else is a corrupt or mismatched state file.
    pub fn load_state(&mut self, stored: &[(String, Vec<f32>)]) -> Result<()> {
        let params = self.named_params();
        for (name, values) in stored {
            let target = params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, t)| t)
                .ok_or_else(|| Error::Serialization(format!("unknown parameter '{name}'")))?;
            if target.len() != values.len() {
                return Err(Error::Serialization(format!(
                    "parameter '{name}' has {} values, expected {}",
                    values.len(),
                    target.len()
                )));
            }
            target.set_data(Array1::from(values.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn tag_round_trip() {
        for kind in [
            NetworkKind::Mlp,
            NetworkKind::Affine,
            NetworkKind::Stable,
            NetworkKind::Flow,
        ] {
            assert_eq!(kind.as_str().parse::<NetworkKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "lstm".parse::<NetworkKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedNetworkType(tag) if tag == "lstm"));
    }

    #[test]
    fn init_produces_matching_kind() {
        let goal = arr1(&[1.0, 2.0]);
        let mut r = rng();
        for kind in [
            NetworkKind::Mlp,
            NetworkKind::Affine,
            NetworkKind::Stable,
            NetworkKind::Flow,
        ] {
            let net = PolicyNet::init(kind, 2, &goal, &mut r);
            assert_eq!(net.kind(), kind);
            assert_eq!(net.predict(&arr1(&[0.0, 0.0])).len(), 2);
        }
    }

    #[test]
    fn only_stable_exposes_potential() {
        let goal = arr1(&[0.0, 0.0]);
        let mut r = rng();
        let x = arr1(&[1.0, 1.0]);

        let stable = PolicyNet::init(NetworkKind::Stable, 2, &goal, &mut r);
        assert!(stable.potential(&x).is_some());

        let mlp = PolicyNet::init(NetworkKind::Mlp, 2, &goal, &mut r);
        assert!(mlp.potential(&x).is_none());

        let flow = PolicyNet::init(NetworkKind::Flow, 2, &goal, &mut r);
        assert!(flow.potential(&x).is_none());
    }

    #[test]
    fn load_state_rejects_unknown_parameter() {
        let goal = arr1(&[0.0, 0.0]);
        let mut net = PolicyNet::init(NetworkKind::Affine, 2, &goal, &mut rng());
        let err = net
            .load_state(&[("nonsense.weight".to_string(), vec![0.0])])
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn load_state_rejects_wrong_shape() {
        let goal = arr1(&[0.0, 0.0]);
        let mut net = PolicyNet::init(NetworkKind::Affine, 2, &goal, &mut rng());
        let name = net.named_params()[0].0.clone();
        let err = net.load_state(&[(name, vec![0.0])]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn load_state_round_trips_prediction() {
        let goal = arr1(&[0.5, -0.5]);
        let x = arr1(&[0.3, 0.9]);
        let mut r = rng();

        let source = PolicyNet::init(NetworkKind::Mlp, 2, &goal, &mut r);
        let stored: Vec<(String, Vec<f32>)> = source
            .named_params()
            .into_iter()
            .map(|(n, t)| (n, t.data().to_vec()))
            .collect();

        let mut target = PolicyNet::init(NetworkKind::Mlp, 2, &goal, &mut r);
        target.load_state(&stored).unwrap();

        assert_eq!(source.predict(&x), target.predict(&x));
    }
}
