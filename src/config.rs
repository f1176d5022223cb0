pub mod gtm;
