use std::{f32::consts::LN_2, fmt::Debug};

use burn::tensor::{backend::Backend, Tensor};
use dyn_clone::DynClone;

/// An invertible, elementwise transform with a tractable Jacobian.
///
/// All bijectors here act on (batch, event_size) tensors and are diagonal,
/// so the log-det-Jacobian is reported per element with the same shape as
/// the input. Callers reduce over the event dimension.
pub trait Bijector<B: Backend>: DynClone + Debug {
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2>;

    fn inverse(&self, y: Tensor<B, 2>) -> Tensor<B, 2>;

    /// log |dy/dx| evaluated at `x`
    fn forward_log_det_jacobian(&self, x: Tensor<B, 2>) -> Tensor<B, 2>;

    /// log |dx/dy| evaluated at `y`
    fn inverse_log_det_jacobian(&self, y: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward_log_det_jacobian(self.inverse(y)).neg()
    }

    fn name(&self) -> &'static str;
}

dyn_clone::clone_trait_object!(<B> Bijector<B> where B: Backend);

/// softplus(x) = ln(1 + e^x), written so that neither branch overflows.
pub fn softplus<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    x.clone().clamp_min(0.0) + x.abs().neg().exp().log1p()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<B: Backend> Bijector<B> for Identity {
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        x
    }

    fn inverse(&self, y: Tensor<B, 2>) -> Tensor<B, 2> {
        y
    }

    fn forward_log_det_jacobian(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        x.zeros_like()
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Largest f32 below 1.
pub const SQUASH_BOUND: f32 = 1.0 - f32::EPSILON / 2.0;

/// tanh, mapping R onto (-1, 1).
///
/// The Jacobian uses `log(1 - tanh(x)^2) = 2 * (log 2 - x - softplus(-2x))`.
/// The left side rounds to log(0) once tanh(x) saturates in f32.
#[derive(Debug, Clone, Copy, Default)]
pub struct Squash;

impl<B: Backend> Bijector<B> for Squash {
    /// tanh rounds to exactly +-1 in f32 for |x| > ~9, so the output is held
    /// to +-`SQUASH_BOUND` to keep it invertible.
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        x.tanh().clamp(-SQUASH_BOUND, SQUASH_BOUND)
    }

    /// atanh. Values on or outside +-1 give infinities or NaN.
    fn inverse(&self, y: Tensor<B, 2>) -> Tensor<B, 2> {
        (y.clone().log1p() - y.neg().log1p()).mul_scalar(0.5)
    }

    fn forward_log_det_jacobian(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let sp = softplus(x.clone().mul_scalar(-2.0));

        x.neg().sub(sp).add_scalar(LN_2).mul_scalar(2.0)
    }

    fn name(&self) -> &'static str {
        "squash"
    }
}

/// y = shift + exp(log_scale_diag) * x
///
/// `shift` and `log_scale_diag` are usually (batch, event_size) tensors
/// produced per conditioning row; (1, event_size) broadcasts.
#[derive(Debug, Clone)]
pub struct Affine<B: Backend> {
    shift: Tensor<B, 2>,
    log_scale_diag: Tensor<B, 2>,
}

impl<B: Backend> Affine<B> {
    pub fn new(shift: Tensor<B, 2>, log_scale_diag: Tensor<B, 2>) -> Self {
        assert_eq!(
            shift.dims()[1],
            log_scale_diag.dims()[1],
            "shift and scale must have the same event size"
        );

        Self {
            shift,
            log_scale_diag,
        }
    }

    pub fn shift(&self) -> Tensor<B, 2> {
        self.shift.clone()
    }

    pub fn scale_diag(&self) -> Tensor<B, 2> {
        self.log_scale_diag.clone().exp()
    }
}

impl<B: Backend> Bijector<B> for Affine<B> {
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.shift.clone() + self.scale_diag() * x
    }

    fn inverse(&self, y: Tensor<B, 2>) -> Tensor<B, 2> {
        (y - self.shift.clone()) / self.scale_diag()
    }

    fn forward_log_det_jacobian(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        x.zeros_like() + self.log_scale_diag.clone()
    }

    fn name(&self) -> &'static str {
        "affine"
    }
}

/// Composition of bijectors.
///
/// Follows the usual chain convention: `Chain::new(vec![f, g])` computes
/// `f(g(x))` going forward, so the last element is applied first.
#[derive(Debug, Clone)]
pub struct Chain<B: Backend> {
    bijectors: Vec<Box<dyn Bijector<B>>>,
}

impl<B: Backend> Chain<B> {
    pub fn new(bijectors: Vec<Box<dyn Bijector<B>>>) -> Self {
        Self { bijectors }
    }

    pub fn len(&self) -> usize {
        self.bijectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bijectors.is_empty()
    }

    /// component names in application order
    pub fn names(&self) -> Vec<&'static str> {
        self.bijectors.iter().rev().map(|b| b.name()).collect()
    }
}

impl<B: Backend> Bijector<B> for Chain<B> {
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.bijectors
            .iter()
            .rev()
            .fold(x, |acc, b| b.forward(acc))
    }

    fn inverse(&self, y: Tensor<B, 2>) -> Tensor<B, 2> {
        self.bijectors.iter().fold(y, |acc, b| b.inverse(acc))
    }

    fn forward_log_det_jacobian(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut ldj = x.zeros_like();
        let mut x = x;

        for b in self.bijectors.iter().rev() {
            ldj = ldj + b.forward_log_det_jacobian(x.clone());
            x = b.forward(x);
        }

        ldj
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

#[cfg(test)]
mod test {
    use assert_approx_eq::assert_approx_eq;
    use burn::{
        backend::{Autodiff, NdArray},
        tensor::Tensor,
    };

    use super::{softplus, Affine, Bijector, Chain, Identity, Squash, SQUASH_BOUND};

    type Backend = NdArray;

    fn to_vec(t: Tensor<Backend, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn softplus_is_stable() {
        let x = Tensor::<Backend, 2>::from_floats([[-100.0, 0.0, 100.0]], &Default::default());
        let out = to_vec(softplus(x));

        assert_approx_eq!(out[0], 0.0, 1e-6);
        assert_approx_eq!(out[1], 2.0f32.ln(), 1e-6);
        assert_approx_eq!(out[2], 100.0, 1e-4);
    }

    #[test]
    fn squash_jacobian_large_inputs_finite() {
        let x = Tensor::<Backend, 2>::from_floats([[50.0, -50.0]], &Default::default());
        let ldj = to_vec(Bijector::<Backend>::forward_log_det_jacobian(&Squash, x));

        let expected = 2.0 * (2.0f32.ln() - 50.0);
        for v in ldj {
            assert!(v.is_finite());
            assert!(v < -90.0);
            assert_approx_eq!(v, expected, 1e-3);
        }
    }

    #[test]
    fn squash_jacobian_matches_naive_form() {
        let xs: [f32; 5] = [-2.0, -0.5, 0.0, 0.3, 1.7];
        let x = Tensor::<Backend, 2>::from_floats([xs], &Default::default());
        let ldj = to_vec(Squash.forward_log_det_jacobian(x));

        for (v, x) in ldj.into_iter().zip(xs) {
            let naive = (1.0 - x.tanh().powi(2)).ln();
            assert_approx_eq!(v, naive, 1e-4);
        }
    }

    #[test]
    fn squash_inverts() {
        let x = Tensor::<Backend, 2>::from_floats([[-3.0, -0.1, 0.0, 2.5]], &Default::default());
        let y = Squash.forward(x.clone());

        for (a, b) in to_vec(Squash.inverse(y)).into_iter().zip(to_vec(x)) {
            assert_approx_eq!(a, b, 1e-3);
        }
    }

    #[test]
    fn squash_saturated_output_stays_invertible() {
        let x = Tensor::<Backend, 2>::from_floats([[50.0, -50.0, 9.5]], &Default::default());
        let y = Bijector::<Backend>::forward(&Squash, x);
        let yv = to_vec(y.clone());

        assert!(yv.iter().all(|v| v.abs() < 1.0), "{yv:?}");
        assert_eq!(yv[0], SQUASH_BOUND);
        assert_eq!(yv[1], -SQUASH_BOUND);

        let back = to_vec(Squash.inverse(y));
        assert!(back.iter().all(|v| v.is_finite() && v.abs() > 8.0), "{back:?}");
    }

    #[test]
    fn squash_inverse_out_of_range_is_not_finite() {
        let y = Tensor::<Backend, 2>::from_floats([[1.0, -1.0]], &Default::default());

        assert!(to_vec(Bijector::<Backend>::inverse(&Squash, y))
            .iter()
            .all(|v| !v.is_finite()));
    }

    #[test]
    fn identity_is_noop() {
        let x = Tensor::<Backend, 2>::from_floats([[4.0, -7.0]], &Default::default());

        assert!(Identity.forward(x.clone()).equal(x.clone()).all().into_scalar());
        assert!(Identity.inverse(x.clone()).equal(x.clone()).all().into_scalar());
        assert_eq!(to_vec(Identity.forward_log_det_jacobian(x)), vec![0.0, 0.0]);
    }

    #[test]
    fn affine_forward_inverse_and_jacobian() {
        let device = Default::default();
        let shift = Tensor::<Backend, 2>::from_floats([[1.0, -1.0]], &device);
        let log_scale = Tensor::<Backend, 2>::from_floats([[0.0, 2.0f32.ln()]], &device);
        let affine = Affine::new(shift, log_scale);

        let x = Tensor::<Backend, 2>::from_floats([[2.0, 3.0]], &device);
        let y = affine.forward(x.clone());
        let fwd = to_vec(y.clone());
        assert_approx_eq!(fwd[0], 3.0, 1e-6);
        assert_approx_eq!(fwd[1], 5.0, 1e-5);

        let back = to_vec(affine.inverse(y));
        assert_approx_eq!(back[0], 2.0, 1e-6);
        assert_approx_eq!(back[1], 3.0, 1e-6);

        let ldj = to_vec(affine.forward_log_det_jacobian(x));
        assert_approx_eq!(ldj[0], 0.0, 1e-6);
        assert_approx_eq!(ldj[1], 2.0f32.ln(), 1e-6);
    }

    #[test]
    fn chain_applies_last_first() {
        let device = Default::default();
        let shift = Tensor::<Backend, 2>::from_floats([[0.5, -0.5]], &device);
        let log_scale = Tensor::<Backend, 2>::from_floats([[0.3, -0.2]], &device);
        let affine = Affine::new(shift, log_scale);
        let chain: Chain<Backend> = Chain::new(vec![Box::new(Squash), Box::new(affine.clone())]);

        assert_eq!(chain.names(), vec!["affine", "squash"]);

        let x = Tensor::<Backend, 2>::from_floats([[0.2, 1.1]], &device);
        let expected = affine.forward(x.clone()).tanh();
        for (a, b) in to_vec(chain.forward(x.clone())).into_iter().zip(to_vec(expected)) {
            assert_approx_eq!(a, b, 1e-6);
        }

        let expected_ldj = affine.forward_log_det_jacobian(x.clone())
            + Squash.forward_log_det_jacobian(affine.forward(x.clone()));
        for (a, b) in to_vec(chain.forward_log_det_jacobian(x.clone()))
            .into_iter()
            .zip(to_vec(expected_ldj))
        {
            assert_approx_eq!(a, b, 1e-6);
        }

        let back = to_vec(chain.inverse(chain.forward(x.clone())));
        for (a, b) in back.into_iter().zip(to_vec(x.clone())) {
            assert_approx_eq!(a, b, 1e-4);
        }

        let ildj = to_vec(chain.inverse_log_det_jacobian(chain.forward(x.clone())));
        for (a, b) in ildj.into_iter().zip(to_vec(chain.forward_log_det_jacobian(x))) {
            assert_approx_eq!(a, -b, 1e-3);
        }
    }

    #[test]
    fn affine_passes_gradients_to_shift() {
        type AD = Autodiff<NdArray>;
        let device = Default::default();
        let shift = Tensor::<AD, 2>::from_floats([[0.0, 0.0]], &device).require_grad();
        let log_scale = Tensor::<AD, 2>::from_floats([[0.0, 0.0]], &device).require_grad();
        let chain: Chain<AD> = Chain::new(vec![
            Box::new(Squash),
            Box::new(Affine::new(shift.clone(), log_scale.clone())),
        ]);

        let x = Tensor::<AD, 2>::from_floats([[0.1, -0.2]], &device);
        let grads = chain.forward(x).sum().backward();

        assert!(shift.grad(&grads).is_some());
        assert!(log_scale.grad(&grads).is_some());
    }
}
