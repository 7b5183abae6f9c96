/*
 * Responsibility
 * - ドメインに近い処理 (トークン発行/検証、パスワードハッシュ、ファイル本体の保存)
 * - DB には依存しない
 */
pub mod password;
pub mod storage;
pub mod token;
