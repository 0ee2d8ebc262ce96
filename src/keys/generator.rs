use crate::channel::Channel;
use crate::keys::field::Field;
use crate::keys::parameter_key::ParameterKey;
use crate::model::{Component, ModelDescriptor};

/// Canonical ordered parameter keys of a model in a channel
///
/// Lens keys go first and carry no channel suffix, then the channel background, then for every
/// component in the [Component::ALL] order, for every field of the component, for every pulse
/// index having this component: `<field>_<pulse>_<channel>`. Identical inputs always give
/// identical output.
pub fn parameter_keys(model: &ModelDescriptor, channel: Channel) -> Vec<ParameterKey> {
    let lens_keys = model
        .lens()
        .then_some(Field::LENS.map(ParameterKey::global))
        .into_iter()
        .flatten();
    let component_keys = Component::ALL.into_iter().flat_map(move |component| {
        component.fields().iter().flat_map(move |&field| {
            model
                .indices(component)
                .iter()
                .map(move |&pulse| ParameterKey::pulse(field, pulse, channel))
        })
    });
    lens_keys
        .chain(std::iter::once(ParameterKey::background(channel)))
        .chain(component_keys)
        .collect()
}

/// String form of [parameter_keys]
pub fn parameter_key_strings(model: &ModelDescriptor, channel: Channel) -> Vec<String> {
    parameter_keys(model, channel)
        .iter()
        .map(ToString::to_string)
        .collect()
}
