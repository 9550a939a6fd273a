pub mod classifier_trait;
pub mod factory;
pub mod naive_bayes;
pub mod network;
pub mod svm;
