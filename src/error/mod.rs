/*!
 This module defines the errors that can happen when reading or writing property list data.
*/

pub mod binary;
pub mod openstep;
pub mod plist;
pub mod xml;
