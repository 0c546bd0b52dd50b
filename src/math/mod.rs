pub mod irr;
