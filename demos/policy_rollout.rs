use std::path::PathBuf;

use burn::{
    backend::{Autodiff, NdArray},
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{Distribution, Tensor},
};
use gaussian_policy_burn::{
    common::{
        logger::{CsvLogger, LogData, Logger},
        spaces::{ActionRescaler, BoxSpace},
        utils::modules::{Activation, MLP},
    },
    policy::{GaussianPolicyConfig, Policy},
};

const OBS_DIM: usize = 3;
const N_ACTIONS: usize = 1;
const BATCH: usize = 32;

fn main() {
    type TrainingBackend = Autodiff<NdArray>;

    let device = Default::default();

    let config = GaussianPolicyConfig::new(vec![OBS_DIM], vec![N_ACTIONS], vec![64, 64])
        .with_activation(Activation::Relu)
        .with_name(Some("pendulum_pi".to_string()))
        .with_seed(Some(1234));

    let mut policy = match config.init::<TrainingBackend>(&device) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    // pendulum torque limits
    let rescaler = match ActionRescaler::new(&BoxSpace::from((vec![-2.0], vec![2.0]))) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    let mut logger = CsvLogger::new(PathBuf::from("logs/policy_rollout.csv"), false, true);
    if let Err(e) = logger.check_can_log(true) {
        eprintln!("{e}");
        return;
    }

    let mut optim = AdamConfig::new().init::<TrainingBackend, MLP<TrainingBackend>>();

    for iteration in 0..50 {
        let obs: Tensor<TrainingBackend, 2> =
            Tensor::random([BATCH, OBS_DIM], Distribution::Normal(0.0, 1.0), &device);
        let conditions = vec![obs];

        let actions = policy.actions(&conditions);
        let torques = rescaler.scale(actions.clone().detach());
        let log_pis = policy.log_pis(&conditions, actions);

        // maximise entropy only, a stand-in for the SAC actor loss
        let loss = log_pis.clone().mean();
        let grads = GradientsParams::from_grads(loss.backward(), policy.conditioner_net());
        let net = optim.step(3e-4, policy.conditioner_net().clone(), grads);
        policy.set_conditioner_net(net);

        let mut item = policy
            .get_diagnostics(iteration, &conditions)
            .push("iteration".to_string(), LogData::Int(iteration as i32))
            .push(
                "log_pi_mean".to_string(),
                LogData::Float(log_pis.mean().into_scalar()),
            );
        item.insert(
            "torque_abs_max".to_string(),
            LogData::Float(torques.abs().max().into_scalar()),
        );

        logger.log(item);
    }

    logger.print_last();
    if let Err(e) = logger.dump() {
        eprintln!("{e}");
    }
}
