use criterion::{Criterion, criterion_group, criterion_main};
use light_curve_pulse::ndarray::Array1;
use light_curve_pulse::{
    Channel, CountSeries, JointLikelihood, ModelDescriptor, ParameterMap, PoissonLikelihood,
    PriorBounds, PriorSet, rate,
};
use light_curve_pulse_test_util::{SIMULATED_FRED_BURST, simulated_fred_parameters};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

fn simulated_series() -> CountSeries {
    let (left, right, counts) = SIMULATED_FRED_BURST.clone();
    CountSeries::new(left, right, counts)
}

pub fn bench_rate_functions(c: &mut Criterion) {
    const N: usize = 1000;
    let t = Array1::linspace(-1.0, 10.0, N);

    c.bench_function("Gaussian pulse", |b| {
        b.iter(|| rate::gaussian_pulse(black_box(t.view()), 1.0, 100.0, 0.5))
    });
    c.bench_function("FRED pulse", |b| {
        b.iter(|| rate::fred_pulse(black_box(t.view()), 1.0, 100.0, 1.0, 1.0))
    });
    c.bench_function("FRED-X pulse", |b| {
        b.iter(|| rate::fredx_pulse(black_box(t.view()), 1.0, 100.0, 1.0, 1.0, 1.0, 1.0))
    });
    c.bench_function("Convolution pulse", |b| {
        b.iter(|| rate::convolution_gaussian(black_box(t.view()), 1.0, 100.0, 0.5, 1.0))
    });
    c.bench_function("Modified Bessel residual", |b| {
        b.iter(|| rate::modified_bessel_residual(black_box(t.view()), 10.0, 2.0, 1.5, 1.0, 0.1))
    });
}

pub fn bench_log_likelihood(c: &mut Criterion) {
    let series = simulated_series();
    let bounds = PriorBounds::new(-1.0, 7.2);
    let mut rng = StdRng::seed_from_u64(0);

    for key in ["F", "FsFL", "XCb"] {
        let model = ModelDescriptor::decode(key).unwrap();
        let likelihood = PoissonLikelihood::from_series(&series, &model, Channel::A).unwrap();
        let priors = PriorSet::build(&model, Channel::A, &bounds).unwrap();
        let params = PriorSet::strip_constraints(&priors.sample(&mut rng).unwrap());
        c.bench_function(format!("Poisson log-likelihood {key}").as_str(), |b| {
            b.iter(|| likelihood.log_likelihood_of(black_box(&params)))
        });
    }

    let model = ModelDescriptor::decode("F").unwrap();
    let joint = JointLikelihood::from_series(&series, &model, &Channel::ALL).unwrap();
    let params: ParameterMap = Channel::ALL
        .iter()
        .flat_map(|c| simulated_fred_parameters(c.index()))
        .collect();
    c.bench_function("Joint log-likelihood of four channels", |b| {
        b.iter(|| joint.log_likelihood_of(black_box(&params)))
    });
}

pub fn bench_prior_sampling(c: &mut Criterion) {
    let bounds = PriorBounds::new(0.0, 10.0);
    let model = ModelDescriptor::decode("FsFsFsFs").unwrap();
    let priors = PriorSet::build(&model, Channel::A, &bounds).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    c.bench_function("Prior sample with ordering constraints", |b| {
        b.iter(|| priors.sample_values(black_box(&mut rng)))
    });
}

criterion_group!(
    benches,
    bench_rate_functions,
    bench_log_likelihood,
    bench_prior_sampling
);
criterion_main!(benches);
