mod build;
mod interaction;
mod view;

pub(crate) use interaction::ViewConfig;
pub(in crate::app) use interaction::Interaction;
