pub mod fmgc;
