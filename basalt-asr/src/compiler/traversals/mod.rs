//  MOD.rs
//    by Lut99
//
//  Created:
//    20 Mar 2024, 10:02:17
//  Last edited:
//    15 Jul 2024, 11:12:03
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the built-in traversals over the ASR.
//

// Declare the subsubmodules
pub mod pickle;
pub mod validate;
pub mod interface;
pub mod const_fold;
