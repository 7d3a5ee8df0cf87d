use burn::tensor::{backend::Backend, Tensor};

use crate::common::{
    distributions::{
        bijector::{Affine, Bijector, Chain, Identity, Squash},
        normal::StandardNormalDiag,
        transformed::TransformedDistribution,
    },
    utils::modules::{Activation, MLP},
};

use super::config::GaussianPolicyConfig;

/// Hard bounds on the log of the Gaussian scale. Keeps the scale away from
/// both zero and overflow whatever the network outputs.
pub const SCALE_DIAG_MIN_MAX: (f32, f32) = (-20.0, 2.0);

/// Per-row Gaussian parameters produced by the conditioner.
///
/// # Shapes
/// shift: (batch, action_dim)
/// log_scale_diag: (batch, action_dim), already clipped
#[derive(Debug, Clone)]
pub struct PolicyParameters<B: Backend> {
    pub shift: Tensor<B, 2>,
    pub log_scale_diag: Tensor<B, 2>,
}

impl<B: Backend> PolicyParameters<B> {
    pub fn batch_size(&self) -> usize {
        self.shift.dims()[0]
    }

    /// The transform from base latents to actions: affine first, then the
    /// squash (or identity). Sampling and scoring both build it here.
    pub fn bijector(&self, squash: bool) -> Chain<B> {
        let squash_bijector: Box<dyn Bijector<B>> = if squash {
            Box::new(Squash)
        } else {
            Box::new(Identity)
        };
        let affine: Box<dyn Bijector<B>> = Box::new(Affine::new(
            self.shift.clone(),
            self.log_scale_diag.clone(),
        ));

        Chain::new(vec![squash_bijector, affine])
    }

    pub fn distribution(&self, squash: bool) -> TransformedDistribution<B, StandardNormalDiag> {
        TransformedDistribution::new(
            StandardNormalDiag::new(self.shift.dims()[1]),
            Box::new(self.bijector(squash)),
        )
    }
}

/// Feed-forward network mapping concatenated conditioning inputs to
/// `PolicyParameters`. Holds every trainable weight of the policy.
#[derive(Debug, Clone)]
pub struct Conditioner<B: Backend> {
    net: MLP<B>,
    input_shapes: Vec<usize>,
    action_dim: usize,
    activation: Activation,
    output_activation: Activation,
    log_scale_min: f32,
    log_scale_max: f32,
}

impl<B: Backend> Conditioner<B> {
    pub fn new(config: &GaussianPolicyConfig, device: &B::Device) -> Self {
        let action_dim = config.action_dim();

        let mut sizes = Vec::with_capacity(config.hidden_layer_sizes.len() + 2);
        sizes.push(config.condition_dim());
        sizes.extend_from_slice(&config.hidden_layer_sizes);
        sizes.push(2 * action_dim);

        Self {
            net: MLP::new(&sizes, device),
            input_shapes: config.input_shapes.clone(),
            action_dim,
            activation: config.activation,
            output_activation: config.output_activation,
            log_scale_min: config.log_scale_min,
            log_scale_max: config.log_scale_max,
        }
    }

    pub fn net(&self) -> &MLP<B> {
        &self.net
    }

    /// Swaps in updated weights, e.g. after an optimizer step.
    pub fn set_net(&mut self, net: MLP<B>) {
        self.net = net;
    }

    pub fn input_shapes(&self) -> &[usize] {
        &self.input_shapes
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    /// Joins the conditioning sources along the feature axis.
    pub fn concat(&self, conditions: &[Tensor<B, 2>]) -> Tensor<B, 2> {
        assert_eq!(
            conditions.len(),
            self.input_shapes.len(),
            "expected {} conditioning inputs, got {}",
            self.input_shapes.len(),
            conditions.len()
        );

        if conditions.len() == 1 {
            return conditions[0].clone();
        }

        Tensor::cat(conditions.to_vec(), 1)
    }

    pub fn forward(&self, conditions: &[Tensor<B, 2>]) -> PolicyParameters<B> {
        let x = self.concat(conditions);
        let out = self.net.forward(x, self.activation, self.output_activation);

        let b = out.dims()[0];
        let n = self.action_dim;

        let shift = out.clone().slice([0..b, 0..n]);
        let log_scale_diag = out
            .slice([0..b, n..n * 2])
            .clamp(self.log_scale_min, self.log_scale_max);

        PolicyParameters {
            shift,
            log_scale_diag,
        }
    }
}

#[cfg(test)]
mod test {
    use burn::{
        backend::NdArray,
        tensor::{Distribution, Tensor},
    };

    use crate::policy::config::GaussianPolicyConfig;

    use super::{Conditioner, PolicyParameters};

    type Backend = NdArray;

    #[test]
    fn output_split_into_shift_and_scale() {
        let config = GaussianPolicyConfig::new(vec![3, 2], vec![4], vec![8]);
        let conditioner = Conditioner::<Backend>::new(&config, &Default::default());

        let obs = Tensor::<Backend, 2>::random([5, 3], Distribution::Default, &Default::default());
        let ctx = Tensor::<Backend, 2>::random([5, 2], Distribution::Default, &Default::default());
        let params = conditioner.forward(&[obs, ctx]);

        assert_eq!(params.shift.dims(), [5, 4]);
        assert_eq!(params.log_scale_diag.dims(), [5, 4]);
        assert_eq!(params.batch_size(), 5);
        assert_eq!(conditioner.net().n_layers(), 2);
    }

    #[test]
    fn log_scale_clipped_for_extreme_inputs() {
        let config = GaussianPolicyConfig::new(vec![3], vec![2], vec![]);
        let conditioner = Conditioner::<Backend>::new(&config, &Default::default());

        let huge = Tensor::<Backend, 2>::from_floats(
            [[1e6, -1e6, 1e6], [-1e6, 1e6, -1e6], [1e8, 1e8, 1e8]],
            &Default::default(),
        );
        let params = conditioner.forward(&[huge]);

        let ls = params.log_scale_diag.into_data().to_vec::<f32>().unwrap();
        assert!(ls.iter().all(|v| (-20.0..=2.0).contains(v)));
    }

    #[should_panic]
    #[test]
    fn wrong_number_of_sources_panics() {
        let config = GaussianPolicyConfig::new(vec![3, 2], vec![2], vec![]);
        let conditioner = Conditioner::<Backend>::new(&config, &Default::default());

        let obs = Tensor::<Backend, 2>::zeros([1, 3], &Default::default());
        conditioner.forward(&[obs]);
    }

    #[test]
    fn bijector_order_is_affine_then_squash() {
        let device = Default::default();
        let params = PolicyParameters::<Backend> {
            shift: Tensor::zeros([1, 2], &device),
            log_scale_diag: Tensor::zeros([1, 2], &device),
        };

        assert_eq!(params.bijector(true).names(), vec!["affine", "squash"]);
        assert_eq!(params.bijector(false).names(), vec!["affine", "identity"]);
    }
}
